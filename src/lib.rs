pub mod api;
pub mod core;

/// 初始化日志，级别取 `RUST_LOG`，默认 info；重复调用无副作用
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
