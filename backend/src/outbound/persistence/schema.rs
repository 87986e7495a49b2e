//! Diesel table definitions matching `backend/migrations`.
//!
//! Regenerate with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered users and the local date they were last reminded.
    users (id) {
        id -> Uuid,
        display_name -> Text,
        email -> Text,
        /// IANA zone name.
        time_zone -> Text,
        last_reminded_on -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    user_delivery_tokens (user_id, token) {
        user_id -> Uuid,
        token -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Read-only catalogue seeded by the initial migration.
    predefined_medicines (id) {
        id -> Uuid,
        name -> Text,
    }
}

diesel::table! {
    user_defined_medicines (id) {
        id -> Uuid,
        owner_id -> Uuid,
        name -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    routines (id) {
        id -> Uuid,
        owner_id -> Uuid,
        name -> Text,
        /// Back-references to `taken_records`, in recording order.
        taken_ids -> Array<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One medicine entry of a routine.
    ///
    /// Exactly one of the two medicine columns is set, selected by
    /// `medicine_kind`.
    routine_medicines (id) {
        id -> Uuid,
        routine_id -> Uuid,
        position -> Int4,
        medicine_kind -> Text,
        predefined_medicine_id -> Nullable<Uuid>,
        user_defined_medicine_id -> Nullable<Uuid>,
        /// `[{"day": "Monday", "slots": ["Morning"]}, ...]`
        schedule -> Jsonb,
    }
}

diesel::table! {
    taken_records (id) {
        id -> Uuid,
        routine_id -> Uuid,
        routine_medicine_id -> Uuid,
        local_date -> Date,
        weekday -> Text,
        slot -> Text,
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(user_delivery_tokens -> users (user_id));
diesel::joinable!(user_defined_medicines -> users (owner_id));
diesel::joinable!(routines -> users (owner_id));
diesel::joinable!(routine_medicines -> routines (routine_id));
diesel::joinable!(routine_medicines -> predefined_medicines (predefined_medicine_id));
diesel::joinable!(routine_medicines -> user_defined_medicines (user_defined_medicine_id));
diesel::joinable!(taken_records -> routines (routine_id));
diesel::joinable!(taken_records -> routine_medicines (routine_medicine_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_delivery_tokens,
    predefined_medicines,
    user_defined_medicines,
    routines,
    routine_medicines,
    taken_records,
);
