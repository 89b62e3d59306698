//! Media types spoken by the Retailer API.

pub const RETAILER_JSON: &str = "application/vnd.retailer.v10+json";
pub const RETAILER_PDF: &str = "application/vnd.retailer.v10+pdf";
pub const JSON: &str = "application/json";
pub const PDF: &str = "application/pdf";
pub const HTML: &str = "text/html";

/// Whether a `Content-Type` header value denotes a JSON body.
#[must_use]
pub fn is_json(content_type: &str) -> bool {
    content_type.contains(JSON) || content_type.contains(RETAILER_JSON)
}

/// Whether a `Content-Type` header value denotes a PDF document.
#[must_use]
pub fn is_pdf(content_type: &str) -> bool {
    content_type.contains(PDF) || content_type.contains(RETAILER_PDF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_content_types() {
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("application/vnd.retailer.v10+json;charset=UTF-8"));
        assert!(is_pdf("application/pdf"));
        assert!(is_pdf("application/vnd.retailer.v10+pdf"));
        assert!(!is_json("text/html"));
        assert!(!is_pdf("text/plain"));
    }
}
