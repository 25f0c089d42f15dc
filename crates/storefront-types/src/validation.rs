use std::fmt;

use crate::models::MediaKind;

pub const SUBJECT_MAX_CHARS: usize = 100;
pub const CONTENT_MAX_CHARS: usize = 5000;
pub const PRODUCT_NAME_MAX_CHARS: usize = 100;

/// 5 MiB cap on every uploaded image.
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "image/bmp",
    "image/tiff",
];

const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// One or more failed input rules, rendered joined by ", ".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_text(
    errors: &mut ValidationErrors,
    value: &str,
    max: usize,
    missing: &str,
    too_long: &str,
) {
    if value.trim().is_empty() {
        errors.push(missing);
    } else if value.chars().count() > max {
        errors.push(too_long);
    }
}

/// Rules for a customer-authored message.
pub fn check_new_message(subject: &str, content: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_text(&mut errors, subject, SUBJECT_MAX_CHARS, "Subject is required", "Subject is too long");
    check_text(
        &mut errors,
        content,
        CONTENT_MAX_CHARS,
        "Message content is required",
        "Message is too long",
    );
    errors.into_result()
}

/// Rules for an admin reply.
pub fn check_reply(
    recipient_user_id: &str,
    original_message_id: &str,
    subject: &str,
    content: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if recipient_user_id.trim().is_empty() {
        errors.push("User ID is required");
    }
    if original_message_id.trim().is_empty() {
        errors.push("Original message ID is required");
    }
    check_text(&mut errors, subject, SUBJECT_MAX_CHARS, "Subject is required", "Subject is too long");
    check_text(
        &mut errors,
        content,
        CONTENT_MAX_CHARS,
        "Reply content is required",
        "Reply is too long",
    );
    errors.into_result()
}

/// Why an image upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageRejection {
    #[error("No {0} image provided")]
    Missing(&'static str),
    #[error("Invalid file type. Allowed types are JPEG, PNG, GIF, WebP, SVG, BMP, and TIFF")]
    InvalidType,
    #[error("File size must be less than 5MB")]
    TooLarge,
}

/// Checks presence, MIME type and size, in that order.
///
/// `label` names the slot in the "missing" message ("avatar", "background",
/// "product").
pub fn check_image(
    label: &'static str,
    size: usize,
    content_type: Option<&str>,
) -> Result<(), ImageRejection> {
    if size == 0 {
        return Err(ImageRejection::Missing(label));
    }
    let content_type = content_type.unwrap_or_default();
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(ImageRejection::InvalidType);
    }
    if size > MAX_IMAGE_SIZE {
        return Err(ImageRejection::TooLarge);
    }
    Ok(())
}

pub fn check_profile_image(
    kind: MediaKind,
    size: usize,
    content_type: Option<&str>,
) -> Result<(), ImageRejection> {
    check_image(kind.field_name(), size, content_type)
}

/// Extension used in blob paths: the lower-cased alphanumeric suffix of the
/// uploaded file name, or `jpg` when there is none.
pub fn image_extension(file_name: Option<&str>) -> String {
    let ext = file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());
    ext.unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}

/// Parses a non-negative decimal amount with at most two fractional digits
/// into cents: "12.5" -> 1250.
pub fn parse_price(input: &str) -> Option<i64> {
    let input = input.trim();
    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 2 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    whole.checked_mul(100)?.checked_add(frac_cents)
}

pub fn format_price(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Rules for a sale item apart from its image.
pub fn check_sale_item(
    name: &str,
    original_price: &str,
    sale_price: &str,
    rating: u8,
) -> Result<(i64, i64), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_text(
        &mut errors,
        name,
        PRODUCT_NAME_MAX_CHARS,
        "Product name is required",
        "Product name is too long",
    );
    let original = parse_price(original_price);
    if original.is_none() {
        errors.push("Invalid original price");
    }
    let sale = parse_price(sale_price);
    if sale.is_none() {
        errors.push("Invalid sale price");
    }
    if let (Some(original), Some(sale)) = (original, sale) {
        if sale > original {
            errors.push("Sale price cannot exceed original price");
        }
    }
    if !(1..=5).contains(&rating) {
        errors.push("Rating must be between 1 and 5");
    }
    errors.into_result()?;
    Ok((original.unwrap_or_default(), sale.unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_subject_and_content_both_reported() {
        let err = check_new_message("", "  ").unwrap_err();
        assert_eq!(err.to_string(), "Subject is required, Message content is required");
    }

    #[test]
    fn length_limits_are_inclusive() {
        let subject = "s".repeat(SUBJECT_MAX_CHARS);
        let content = "c".repeat(CONTENT_MAX_CHARS);
        assert!(check_new_message(&subject, &content).is_ok());

        let err = check_new_message(&format!("{subject}s"), &content).unwrap_err();
        assert_eq!(err.messages(), ["Subject is too long"]);

        let err = check_new_message(&subject, &format!("{content}c")).unwrap_err();
        assert_eq!(err.messages(), ["Message is too long"]);
    }

    #[test]
    fn limits_count_characters_not_bytes() {
        let subject = "é".repeat(SUBJECT_MAX_CHARS);
        assert!(check_new_message(&subject, "ok").is_ok());
    }

    #[test]
    fn reply_rules_use_reply_wording() {
        let err = check_reply("", "", "Re: Help", "").unwrap_err();
        assert_eq!(
            err.to_string(),
            "User ID is required, Original message ID is required, Reply content is required"
        );
        assert!(check_reply("u", "m", "Re: Help", "Sure").is_ok());
    }

    #[test]
    fn image_checks_run_in_order() {
        assert_eq!(
            check_profile_image(MediaKind::Avatar, 0, Some("text/plain")),
            Err(ImageRejection::Missing("avatar"))
        );
        assert_eq!(
            check_profile_image(MediaKind::Background, MAX_IMAGE_SIZE + 1, Some("text/plain")),
            Err(ImageRejection::InvalidType)
        );
        assert_eq!(
            check_profile_image(MediaKind::Avatar, MAX_IMAGE_SIZE + 1, Some("image/png")),
            Err(ImageRejection::TooLarge)
        );
        assert!(check_profile_image(MediaKind::Avatar, MAX_IMAGE_SIZE, Some("image/svg+xml")).is_ok());
        assert_eq!(
            check_image("avatar", 10, None),
            Err(ImageRejection::InvalidType)
        );
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(
            ImageRejection::Missing("background").to_string(),
            "No background image provided"
        );
        assert_eq!(ImageRejection::TooLarge.to_string(), "File size must be less than 5MB");
    }

    #[test]
    fn extension_falls_back_to_jpg() {
        assert_eq!(image_extension(Some("me.PNG")), "png");
        assert_eq!(image_extension(Some("archive.tar.gz")), "gz");
        assert_eq!(image_extension(Some("noext")), "jpg");
        assert_eq!(image_extension(Some("trailing.")), "jpg");
        assert_eq!(image_extension(Some("evil./../x")), "jpg");
        assert_eq!(image_extension(None), "jpg");
    }

    #[test]
    fn prices_parse_to_cents() {
        assert_eq!(parse_price("12"), Some(1200));
        assert_eq!(parse_price("12.5"), Some(1250));
        assert_eq!(parse_price("0.99"), Some(99));
        assert_eq!(parse_price(".5"), Some(50));
        assert_eq!(parse_price("1.999"), None);
        assert_eq!(parse_price("-1"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("abc"), None);
        assert_eq!(format_price(1250), "12.50");
    }

    #[test]
    fn sale_item_rules() {
        assert_eq!(check_sale_item("Lamp", "20.00", "15", 4), Ok((2000, 1500)));

        let err = check_sale_item("Lamp", "10", "15", 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sale price cannot exceed original price, Rating must be between 1 and 5"
        );

        let err = check_sale_item(" ", "x", "1", 6).unwrap_err();
        assert_eq!(
            err.messages(),
            ["Product name is required", "Invalid original price", "Rating must be between 1 and 5"]
        );
    }
}
