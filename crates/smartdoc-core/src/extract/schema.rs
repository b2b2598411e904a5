//! Field to entity-label schema.

use std::collections::{BTreeSet, HashSet};

use crate::error::ConfigError;
use crate::models::config::FieldMapping;

/// Default field to label mapping.
pub const DEFAULT_FIELD_LABELS: &[(&str, &str)] = &[
    ("Invoice Number", "INVOICE_NUMBER"),
    ("Revision Number", "REVISION_NUMBER"),
    ("Reference Number", "REFERENCE_NUMBER"),
    ("PO Number", "PO_NUMBER"),
    ("Challan Number", "CHALLAN_NUMBER"),
    ("Dispatch Document No", "DISPATCH_DOCUMENT"),
    ("Delivery Note", "DELIVERY_NOTE"),
    ("LR Number", "LR_NUMBER"),
    ("HSN Code", "HSN_CODE"),
    ("Issue Date", "ISSUE_DATE"),
    ("Due Date", "DUE_DATE"),
    ("Delivery Date", "DELIVERY_DATE"),
    ("Bill From", "SELLER"),
    ("Bill To", "BUYER"),
    ("Shipping Address", "SHIP_ADDRESS"),
    ("Authorized Signatory", "SIGNATORY"),
    ("Contact Email", "EMAIL"),
    ("Contact Phone", "PHONE"),
    ("GST Number", "GSTIN"),
    ("PAN Number", "PAN"),
    ("VAT Number", "VAT"),
    ("Service Tax Number", "SERVICE_TAX"),
    ("Vehicle Number", "VEHICLE_NUMBER"),
    ("Transporter Name", "TRANSPORTER"),
    ("E-way Bill No", "EWAY_BILL"),
    ("Payment Terms", "PAYMENT_TERMS"),
    ("Payment Info", "PAYMENT_INFO"),
    ("Currency", "CURRENCY"),
    ("Total Amount", "TOTAL_AMOUNT"),
    ("Tax Amount", "TAX_AMOUNT"),
    ("Advance Payment", "ADVANCE_PAYMENT"),
    ("Balance Due", "BALANCE_DUE"),
    ("Amount in Words", "AMOUNT_IN_WORDS"),
    ("Bank Account", "BANK_ACCOUNT"),
    ("IFSC Code", "IFSC"),
    ("SWIFT Code", "SWIFT"),
    ("IBAN", "IBAN"),
    ("Country of Origin", "ORIGIN_COUNTRY"),
    ("Country of Destination", "DEST_COUNTRY"),
    ("Port of Loading", "PORT_LOADING"),
    ("Port of Discharge", "PORT_DISCHARGE"),
    ("Remarks", "REMARKS"),
    ("Terms and Conditions", "TERMS_AND_CONDITIONS"),
];

/// Validated, ordered field to label schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    entries: Vec<FieldMapping>,
}

impl FieldSchema {
    /// Validate and build. Rejects an empty schema, duplicate fields and
    /// labels outside `[A-Z][A-Z0-9_]*`.
    pub fn new(entries: Vec<FieldMapping>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptySchema);
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.field.as_str()) {
                return Err(ConfigError::DuplicateField(entry.field.clone()));
            }
            if !is_valid_label(&entry.label) {
                return Err(ConfigError::InvalidLabel {
                    field: entry.field.clone(),
                    label: entry.label.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// The built-in schema.
    pub fn defaults() -> Self {
        Self {
            entries: DEFAULT_FIELD_LABELS
                .iter()
                .map(|(field, label)| FieldMapping {
                    field: (*field).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
        }
    }

    /// Label for `field`, if the field is part of the schema.
    pub fn label_for(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.label.as_str())
    }

    /// `(field, label)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|e| (e.field.as_str(), e.label.as_str()))
    }

    pub fn labels(&self) -> BTreeSet<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_valid_label(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
