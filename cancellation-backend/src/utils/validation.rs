// src/utils/validation.rs

use uuid::Uuid;

/// 解約理由の最大文字数
pub const MAX_REASON_CHARS: usize = 500;

/// 解約理由をサニタイズする
///
/// 前後の空白を除去 → 500文字に切り詰め → ASCII制御文字（U+0000–U+001F, U+007F）を除去。
/// 結果が空なら None。
pub fn sanitize_reason(input: Option<&str>) -> Option<String> {
    let trimmed = input?.trim();
    let sanitized: String = trimmed
        .chars()
        .take(MAX_REASON_CHARS)
        .filter(|c| !c.is_ascii_control())
        .collect();

    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// クライアントから渡されたサブスクリプションIDを解釈する
///
/// ハイフン区切り36文字のUUIDのみ受け付け、それ以外は None（エラーにはしない）。
pub fn parse_subscription_id(raw: Option<&str>) -> Option<Uuid> {
    let raw = raw?.trim();
    if raw.len() != 36 {
        return None;
    }
    Uuid::parse_str(raw).ok()
}
