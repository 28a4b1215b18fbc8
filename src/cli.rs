use clap::Parser;

/// 微信网页版扫码登录
#[derive(Parser, Debug)]
#[command(name = "wxlogin")]
#[command(version = "0.1")]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "扫码登录微信网页版并持续接收新消息", long_about = None)]
pub struct Cli {
    /// 使用桌面模式登录
    #[arg(long)]
    #[arg(help = "部分账号无法网页登录时可以尝试桌面模式")]
    pub desktop: bool,

    /// 请求超时时间（秒）
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// 扫码状态轮询间隔（秒）
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    pub poll_interval: u64,

    /// 最多轮询次数
    #[arg(long, value_name = "COUNT", default_value_t = 120)]
    pub max_polls: usize,

    /// 同步检查间隔（秒）
    #[arg(long, value_name = "SECS", default_value_t = 1)]
    pub sync_interval: u64,

    /// 输出调试日志
    #[arg(long, short)]
    pub verbose: bool,
}
