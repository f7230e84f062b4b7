use std::path::PathBuf;

pub fn default_hostname() -> String {
    "0.0.0.0".to_string()
}

pub fn default_grpc_port() -> u16 {
    9010
}

pub fn default_http_port() -> u16 {
    9020
}

pub fn default_server_binary() -> PathBuf {
    PathBuf::from("./gateway_main")
}

pub fn default_stop_grace_ms() -> u64 {
    5000
}

pub fn default_instance_config() -> String {
    "emulator-config".to_string()
}

pub fn default_node_count() -> i32 {
    1
}

pub fn default_operation_poll_interval_ms() -> u64 {
    500
}

pub fn default_connect_retry_interval_ms() -> u64 {
    250
}
