use crate::i18n::{MessageId, Strings};
use anyhow::{Context, Result};
use image::ImageReader;
use std::path::Path;

/// 图标加载失败时使用的占位尺寸
pub const FALLBACK_ICON_SIZE: u32 = 32;

/// 占位图标颜色
pub const FALLBACK_ICON_COLOR: [u8; 4] = [103, 80, 164, 255];

/// 解码后的 RGBA 图标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl IconImage {
    /// 纯色图标
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            rgba,
            width,
            height,
        }
    }

    pub fn fallback() -> Self {
        Self::solid(FALLBACK_ICON_SIZE, FALLBACK_ICON_SIZE, FALLBACK_ICON_COLOR)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.rgba.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn into_tauri(self) -> tauri::image::Image<'static> {
        tauri::image::Image::new_owned(self.rgba, self.width, self.height)
    }
}

/// 按文件内容识别格式并解码为 RGBA
pub fn decode_icon(path: &Path) -> Result<IconImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("无法打开图标文件: {path:?}"))?
        .with_guessed_format()
        .with_context(|| format!("无法识别图标格式: {path:?}"))?
        .decode()
        .with_context(|| format!("无法解码图标: {path:?}"))?
        .to_rgba8();

    let (width, height) = image.dimensions();
    Ok(IconImage {
        rgba: image.into_raw(),
        width,
        height,
    })
}

/// 加载托盘图标，失败时返回占位图标
pub fn load_icon(path: &Path, strings: &dyn Strings, show_console: bool) -> IconImage {
    match decode_icon(path) {
        Ok(icon) => icon,
        Err(e) => {
            tracing::debug!(error = ?e, "托盘图标加载失败，使用占位图标");
            if show_console {
                let error = format!("{e:#}");
                println!(
                    "{}",
                    strings.text(MessageId::ErrorLoadIcon, &[("error", &error)])
                );
            }
            IconImage::fallback()
        }
    }
}
