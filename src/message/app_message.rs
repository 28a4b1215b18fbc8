use quick_xml::escape::escape;

const FILE_APP_ID: &str = "wxeb7ec651dd0aefa9";

/// 文件消息的 appmsg 内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAppMessage {
    pub title: String,
    pub total_len: usize,
    pub attach_id: String,
    pub file_ext: String,
}

impl FileAppMessage {
    pub fn new(
        title: impl Into<String>,
        total_len: usize,
        attach_id: impl Into<String>,
        file_ext: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            total_len,
            attach_id: attach_id.into(),
            file_ext: file_ext.into(),
        }
    }

    pub fn to_xml(&self) -> String {
        format!(
            "<appmsg appid='{}' sdkver=''><title>{}</title><des></des><action></action>\
             <type>6</type><content></content><url></url><lowurl></lowurl>\
             <appattach><totallen>{}</totallen><attachid>{}</attachid><fileext>{}</fileext></appattach>\
             <extinfo></extinfo></appmsg>",
            FILE_APP_ID,
            escape(self.title.as_str()),
            self.total_len,
            escape(self.attach_id.as_str()),
            escape(self.file_ext.as_str()),
        )
    }
}
