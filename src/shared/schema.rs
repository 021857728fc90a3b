diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    user_sessions (id) {
        id -> Uuid,
        user_id -> Uuid,
        token -> Varchar,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    api_keys (id) {
        id -> Uuid,
        user_id -> Uuid,
        key_hash -> Varchar,
        created_at -> Timestamptz,
        expires_at -> Timestamptz,
        is_active -> Bool,
    }
}

diesel::table! {
    leads (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        company -> Varchar,
        phone -> Nullable<Varchar>,
        source -> Nullable<Varchar>,
        status -> Varchar,
        score -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    opportunities (id) {
        id -> Uuid,
        user_id -> Uuid,
        lead_id -> Uuid,
        title -> Varchar,
        amount -> Numeric,
        stage -> Varchar,
        description -> Text,
        expected_close_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        user_id -> Uuid,
        opportunity_id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        category -> Varchar,
        due_date -> Nullable<Timestamptz>,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    emails (id) {
        id -> Uuid,
        user_id -> Uuid,
        lead_id -> Nullable<Uuid>,
        sender -> Varchar,
        subject -> Varchar,
        content -> Text,
        received_date -> Timestamptz,
        analysis_result -> Nullable<Jsonb>,
        analyzed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    messages (id) {
        id -> Uuid,
        user_id -> Uuid,
        content -> Text,
        priority -> Varchar,
        sentiment -> Varchar,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        content -> Text,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ai_insights (id) {
        id -> Uuid,
        user_id -> Uuid,
        content -> Text,
        confidence_score -> Float8,
        category -> Varchar,
        created_at -> Timestamptz,
    }
}
