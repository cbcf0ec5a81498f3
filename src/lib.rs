pub mod api;
pub mod core;
pub mod face_guide;

pub use api::models;

pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("stylecam_rust"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        // 重复初始化时 try_init 返回 Err，忽略即可
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}
