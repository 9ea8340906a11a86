//! Diesel schema for task persistence.
//!
//! The `users` table referenced by `tasks.user_id` belongs to the
//! authentication layer and is not mapped here.

diesel::table! {
    /// Task records scoped to their owning user.
    tasks (id) {
        /// Store-assigned task identifier.
        id -> Int8,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Task description.
        description -> Text,
        /// Task status.
        #[max_length = 20]
        status -> Varchar,
        /// Owning user.
        user_id -> Int8,
    }
}

