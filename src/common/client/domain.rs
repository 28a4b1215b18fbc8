/// 登录后按跳转地址的 host 选定的地域域名，整个会话都用它
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WxDomain {
    host: &'static str,
    file_host: &'static str,
    sync_host: &'static str,
}

const DOMAINS: &[WxDomain] = &[
    WxDomain::new("wx.qq.com", "file.wx.qq.com", "webpush.wx.qq.com"),
    WxDomain::new("wx2.qq.com", "file.wx2.qq.com", "webpush.wx2.qq.com"),
    WxDomain::new("wx8.qq.com", "file.wx8.qq.com", "webpush.wx8.qq.com"),
    WxDomain::new("web.wechat.com", "file.web.wechat.com", "webpush.web.wechat.com"),
    WxDomain::new("web2.wechat.com", "file.web2.wechat.com", "webpush.web2.wechat.com"),
    WxDomain::new("wechat.com", "file.web.wechat.com", "webpush.web.wechat.com"),
];

impl WxDomain {
    const fn new(host: &'static str, file_host: &'static str, sync_host: &'static str) -> Self {
        Self {
            host,
            file_host,
            sync_host,
        }
    }

    pub fn from_host(host: &str) -> Option<Self> {
        DOMAINS.iter().find(|d| d.host == host).copied()
    }

    pub fn host(&self) -> &'static str {
        self.host
    }

    pub fn base_url(&self) -> String {
        format!("https://{}", self.host)
    }

    pub fn file_url(&self) -> String {
        format!("https://{}", self.file_host)
    }

    pub fn sync_url(&self) -> String {
        format!("https://{}", self.sync_host)
    }
}

impl Default for WxDomain {
    fn default() -> Self {
        DOMAINS[0]
    }
}
