// 会话索引键中的用户名做十六进制编码，避免用户名里的 ':' 破坏前缀扫描

pub fn session_key(token_hash: &str) -> String {
    token_hash.to_string()
}

pub fn session_user_index_key(username: &str, token_hash: &str) -> String {
    format!("{}{}", session_user_index_prefix(username), token_hash)
}

pub fn session_user_index_prefix(username: &str) -> String {
    format!("user:{}:", hex::encode(username.as_bytes()))
}

pub fn is_session_index_key(key: &[u8]) -> bool {
    key.starts_with(b"user:")
}
