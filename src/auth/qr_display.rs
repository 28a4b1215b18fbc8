use colored::Colorize;
use qrcode::QrCode;
use qrcode::types::QrError;

const QR_LOGIN_URL: &str = "https://login.weixin.qq.com/l/";

// 手机扫的是这个地址
pub fn qr_login_url(uuid: &str) -> String {
    format!("{}{}", QR_LOGIN_URL, uuid)
}

pub fn display_qr(url: &str) -> Result<(), QrError> {
    println!("{}: ", "请使用手机微信扫描二维码".green());

    let code = QrCode::new(url)?;
    let image = code
        .render::<qrcode::render::unicode::Dense1x2>()
        .quiet_zone(false) // 要不要边缘空白
        .module_dimensions(1, 1)
        .build();

    print!("\n{}\n", image);
    Ok(())
}
