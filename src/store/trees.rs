pub const SESSIONS: &str = "sessions";
