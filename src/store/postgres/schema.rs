//! Diesel schema for the workflow database.

diesel::table! {
    /// Client, vendor and internal organizations.
    organizations (id) {
        /// Organization identifier.
        id -> Uuid,
        /// Unique organization name.
        #[max_length = 255]
        name -> Varchar,
        /// Organization kind.
        #[max_length = 20]
        kind -> Varchar,
        /// Active flag.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Projects owned by an organization.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Owning organization.
        organization_id -> Uuid,
        /// Name, unique per organization.
        #[max_length = 255]
        name -> Varchar,
        /// Project status.
        #[max_length = 20]
        status -> Varchar,
        /// Free-form project kind.
        #[max_length = 255]
        kind -> Varchar,
        /// Free-form metadata.
        metadata -> Nullable<Jsonb>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Batches of tasks owned by a project.
    batches (id) {
        /// Batch identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Name, unique per project.
        #[max_length = 255]
        name -> Varchar,
        /// Batch status.
        #[max_length = 20]
        status -> Varchar,
        /// Workflow settings object.
        settings -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Workflow tasks.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning batch.
        batch_id -> Uuid,
        /// Task name.
        #[max_length = 255]
        name -> Varchar,
        /// Soft-delete flag.
        is_deleted -> Bool,
        /// Current workflow status.
        current_status -> Text,
        /// Current owner.
        current_owner -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only task status ledger.
    task_transitions (id) {
        /// Sequence identifier.
        id -> Int8,
        /// Task the entry belongs to.
        task_id -> Uuid,
        /// Acting user.
        actor_id -> Nullable<Uuid>,
        /// Status before the change.
        from_status -> Nullable<Text>,
        /// Status after the change.
        to_status -> Text,
        /// Owner after the change.
        owner -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Platform users.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Unique username.
        #[max_length = 150]
        username -> Varchar,
        /// Active flag.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Provider accounts linked to users.
    auth_identities (id) {
        /// Sequence identifier.
        id -> Int8,
        /// Owning user.
        user_id -> Uuid,
        /// Provider name.
        #[max_length = 50]
        provider -> Varchar,
        /// Provider subject, unique per provider.
        #[max_length = 255]
        subject -> Varchar,
        /// Email reported by the provider.
        #[max_length = 255]
        email -> Nullable<Varchar>,
        /// Whether the email was verified.
        email_verified -> Bool,
        /// Encoded password hash.
        password_hash -> Nullable<Text>,
        /// Password hashing scheme.
        #[max_length = 50]
        password_hash_method -> Nullable<Varchar>,
        /// When the password was last set.
        password_updated_at -> Nullable<Timestamptz>,
        /// Last successful sign-in.
        last_login_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// User portfolios.
    user_portfolios (id) {
        /// Sequence identifier.
        id -> Int8,
        /// Owning user.
        user_id -> Uuid,
        /// Display name.
        #[max_length = 255]
        display_name -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(projects -> organizations (organization_id));
diesel::joinable!(batches -> projects (project_id));
diesel::joinable!(tasks -> batches (batch_id));
diesel::joinable!(tasks -> users (current_owner));
diesel::joinable!(task_transitions -> tasks (task_id));
diesel::joinable!(auth_identities -> users (user_id));
diesel::joinable!(user_portfolios -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    organizations,
    projects,
    batches,
    tasks,
    task_transitions,
    users,
    auth_identities,
    user_portfolios,
);
