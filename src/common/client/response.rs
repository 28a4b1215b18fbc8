use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::common::client::error::{TransportError, WxError};
use crate::common::client::models::common::{HasStatus, StatusReply, classify};
use crate::common::client::transport::{RawResponse, TransportResult};

const PREVIEW_LEN: usize = 200;

/// 包装一次传输结果，所有解码都从这里走
///
/// 解码方法都会消耗 self，响应体在读取后或 envelope 被丢弃时释放，且只释放一次
#[derive(Debug)]
pub struct ResponseEnvelope {
    result: TransportResult,
}

impl ResponseEnvelope {
    pub fn new(result: TransportResult) -> Self {
        Self { result }
    }

    /// 传输层错误，解码前先看这里
    pub fn err(&self) -> Option<&TransportError> {
        self.result.as_ref().err()
    }

    pub fn into_inner(self) -> Result<RawResponse, WxError> {
        Ok(self.result?)
    }

    pub async fn read_all(self) -> Result<Vec<u8>, WxError> {
        let raw = self.into_inner()?;
        let data = raw.read_all().await?;
        debug!("响应正文: {}", preview(&data));
        Ok(data)
    }

    /// 按正则提取，必须恰好匹配一次且分组数等于 expected_groups
    pub async fn decode_regex(
        self,
        pattern: &Regex,
        expected_groups: usize,
    ) -> Result<Vec<String>, WxError> {
        let data = self.read_all().await?;
        extract_groups(&data, pattern, expected_groups)
    }

    pub async fn decode_json<T: DeserializeOwned>(self) -> Result<T, WxError> {
        let data = self.read_all().await?;
        parse_json(&data)
    }

    /// 成功解码时不再检查状态；结构对不上时再看 BaseResponse，
    /// Ret 不为 0 就返回接口错误，而不是解析错误
    pub async fn decode_json_or_status<T: DeserializeOwned>(self) -> Result<T, WxError> {
        let data = self.read_all().await?;
        parse_json(&data).map_err(|parse_err| {
            match serde_json::from_slice::<StatusReply>(&data) {
                Ok(reply) => classify(&reply).err().unwrap_or(parse_err),
                Err(_) => parse_err,
            }
        })
    }

    pub async fn decode_xml<T: DeserializeOwned>(self) -> Result<T, WxError> {
        let data = self.read_all().await?;
        let text = String::from_utf8_lossy(&data);
        quick_xml::de::from_str::<T>(&text).map_err(|e| {
            error!("XML 结构匹配失败: {}", e);
            WxError::Parse(format!("XML 解析失败: {}. 响应: {}", e, preview(&data)))
        })
    }

    /// 解码 JSON 并检查 BaseResponse
    pub async fn decode_checked<T: DeserializeOwned + HasStatus>(self) -> Result<T, WxError> {
        let reply = self.decode_json::<T>().await?;
        classify(&reply)?;
        Ok(reply)
    }

    /// 只需要知道成功与否的接口
    pub async fn expect_ok(self) -> Result<(), WxError> {
        self.decode_checked::<StatusReply>().await.map(|_| ())
    }
}

/// 从自由文本中提取分组
///
/// 没匹配上或者匹配到多处都算格式变了（或者当前 IP 被拉黑），直接报解析错误
pub fn extract_groups(
    data: &[u8],
    pattern: &Regex,
    expected_groups: usize,
) -> Result<Vec<String>, WxError> {
    let text = String::from_utf8_lossy(data);
    let mut matches = pattern.captures_iter(&text);

    let captures = match (matches.next(), matches.next()) {
        (Some(captures), None) => captures,
        (None, _) => {
            return Err(WxError::Parse(format!(
                "pattern mismatch: `{}` 未匹配",
                pattern.as_str()
            )));
        }
        (Some(_), Some(_)) => {
            return Err(WxError::Parse(format!(
                "pattern mismatch: `{}` 匹配到多处",
                pattern.as_str()
            )));
        }
    };

    let groups = captures.len() - 1;
    if groups != expected_groups {
        return Err(WxError::Parse(format!(
            "pattern mismatch: 期望 {} 个分组，实际 {} 个",
            expected_groups, groups
        )));
    }

    captures
        .iter()
        .skip(1)
        .map(|group| {
            group
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| WxError::Parse("pattern mismatch: 分组为空".to_string()))
        })
        .collect()
}

fn parse_json<T: DeserializeOwned>(data: &[u8]) -> Result<T, WxError> {
    serde_json::from_slice::<T>(data).map_err(|e| {
        error!("JSON 结构匹配失败: {}", e);
        error!("期望的结构 可能是: {}", std::any::type_name::<T>());
        WxError::Parse(format!("结构匹配失败: {}. 响应: {}", e, preview(data)))
    })
}

fn preview(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.chars().take(PREVIEW_LEN).collect()
}
