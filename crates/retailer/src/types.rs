//! Enumerated request parameters accepted by the Retailer API.

use serde::{Deserialize, Serialize};

macro_rules! api_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL_VALUES: &'static [&'static str] = &[$($wire),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown {} '{other}', expected one of {}",
                        stringify!($name),
                        Self::ALL_VALUES.join(", ")
                    )),
                }
            }
        }
    };
}

api_enum! {
    /// Who ships the order: the retailer (FBR) or bol.com (FBB).
    FulfilmentMethod { Fbr => "FBR", Fbb => "FBB", All => "ALL" }
}

api_enum! {
    OrderStatus { Open => "OPEN", Shipped => "SHIPPED", All => "ALL" }
}

api_enum! {
    InvoiceState { Open => "OPEN", UploadError => "UPLOAD_ERROR", All => "ALL" }
}

api_enum! {
    /// Product condition used in commission calculations.
    #[derive(Default)]
    Condition {
        #[default]
        New => "NEW",
        AsNew => "AS_NEW",
        Good => "GOOD",
        Reasonable => "REASONABLE",
        Moderate => "MODERATE",
    }
}

/// Representation requested for an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceFormat {
    #[default]
    Json,
    Pdf,
    Html,
}

impl InvoiceFormat {
    /// Value for the `Accept` header.
    #[must_use]
    pub fn accept(self) -> &'static str {
        match self {
            Self::Json => crate::media::RETAILER_JSON,
            Self::Pdf => crate::media::RETAILER_PDF,
            Self::Html => crate::media::HTML,
        }
    }
}

/// One product in a bulk commission query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionProduct {
    pub ean: String,
    pub unit_price: f64,
    #[serde(default)]
    pub condition: Condition,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(FulfilmentMethod::Fbb.as_str(), "FBB");
        assert_eq!(InvoiceState::UploadError.to_string(), "UPLOAD_ERROR");
        assert_eq!(
            serde_json::to_value(Condition::AsNew).unwrap(),
            serde_json::json!("AS_NEW")
        );
        assert_eq!("SHIPPED".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
    }

    #[test]
    fn unknown_value_lists_alternatives() {
        let err = "LOST".parse::<OrderStatus>().unwrap_err();
        assert!(err.contains("OPEN, SHIPPED, ALL"));
    }

    #[test]
    fn commission_product_defaults_to_new() {
        let p: CommissionProduct =
            serde_json::from_str(r#"{"ean":"8712345678901","unitPrice":19.99}"#).unwrap();
        assert_eq!(p.condition, Condition::New);
        assert_eq!(Condition::default(), Condition::New);
        assert_eq!(Condition::default().as_str(), Condition::ALL_VALUES[0]);
    }

    #[test]
    fn invoice_format_accept_header() {
        assert_eq!(InvoiceFormat::default().accept(), "application/vnd.retailer.v10+json");
        assert_eq!(InvoiceFormat::Pdf.accept(), "application/vnd.retailer.v10+pdf");
        assert_eq!(InvoiceFormat::Html.accept(), "text/html");
    }
}
