//! 启动器的稳定退出码

/// 预检通过且服务正常结束
pub const OK: i32 = 0;
/// 配置、激活或模块预检失败
pub const PREFLIGHT_FAILED: i32 = 1;
/// Unix 上被信号终止的子进程：128 + 信号编号
pub const SIGNAL_BASE: i32 = 128;
