//! Default pattern table and the regexes behind the heuristic entity detector.

use lazy_static::lazy_static;
use regex::Regex;

/// Default `(field, pattern)` rules, applied case-insensitively in order.
/// The field value is the last capture group of the first match.
pub const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    // Document identifiers
    ("Invoice Number", r"(Invoice No|Invoice #|Invoice ID|Invoice Ref|Inv No|Document No|Receipt No|Bill No)[^\n:]*[:]\s*([A-Z0-9\-/]+)"),
    ("Revision Number", r"(Revision No|Revision Number|Version)[^\n:]*[:]\s*(.+)"),
    ("Reference Number", r"(Reference No|Ref No|Reference Number)[^\n:]*[:]\s*([A-Z0-9\-]+)"),
    ("PO Number", r"(PO Number|Purchase Order|Order No|Order Number)[^\n:]*[:]\s*(.+)"),
    ("Challan Number", r"(Challan No|Challan Number|Challan ID)[^\n:]*[:]\s*(.+)"),
    ("Dispatch Document No", r"(Dispatch Document No|Dispatch Doc No|Dispatch Ref)[^\n:]*[:]\s*(.+)"),
    ("Delivery Note", r"(Delivery Note|Delivery Challan)[^\n:]*[:]\s*(.+)"),
    ("LR Number", r"(LR No|Lorry Receipt No|LR Number)[^\n:]*[:]\s*(.+)"),
    ("HSN Code", r"(HSN Code|HS Code|SAC Code)[^\n:]*[:]\s*([A-Z0-9]+)"),
    // Dates
    ("Issue Date", r"(Issue Date|Invoice Date|Date of Issue)[^\n:]*[:]\s*(.+)"),
    ("Due Date", r"(Due Date|Payment Due|Expiry Date)[^\n:]*[:]\s*(.+)"),
    ("Delivery Date", r"(Delivery Date|Dispatch Date)[^\n:]*[:]\s*(.+)"),
    // Parties
    ("Bill From", r"(From|Seller|Supplier|Issued By)[^\n:]*[:]\s*(.+)"),
    ("Bill To", r"(To|Buyer|Customer|Client|Purchaser|Billed To)[^\n:]*[:]\s*(.+)"),
    ("Shipping Address", r"(Ship To|Delivery Address|Dispatch Address|Consignee)[^\n:]*[:]\s*(.+)"),
    ("Authorized Signatory", r"(Authorized Signatory|Authorized Person)[^\n:]*[:]\s*(.+)"),
    ("Contact Email", r"(Email|E-mail|Email ID|Contact Email)[^\n:]*[:]\s*([\w\.-]+@[\w\.-]+)"),
    ("Contact Phone", r"(Phone|Mobile|Tel|Telephone|Contact No)[^\n:]*[:]\s*([0-9\-\+ ]+)"),
    // Tax registrations
    ("GST Number", r"(GST No|GSTIN|GST Number|GST Registration)[^\n:]*[:]\s*([0-9A-Z]+)"),
    ("PAN Number", r"(PAN No|PAN Number|PAN)[^\n:]*[:]\s*([A-Z0-9]+)"),
    ("VAT Number", r"(VAT No|VAT Number)[^\n:]*[:]\s*([A-Z0-9]+)"),
    ("Service Tax Number", r"(Service Tax No|Service Tax Number)[^\n:]*[:]\s*([A-Z0-9]+)"),
    // Transport
    ("Vehicle Number", r"(Vehicle No|Vehicle Number|Truck No|Truck Number)[^\n:]*[:]\s*([A-Z0-9\-]+)"),
    ("Transporter Name", r"(Transporter Name|Carrier Name|Logistics Partner)[^\n:]*[:]\s*(.+)"),
    ("E-way Bill No", r"(E[- ]?Way Bill No|Eway Bill Number)[^\n:]*[:]\s*([A-Z0-9\-]+)"),
    // Payment
    ("Payment Terms", r"(Payment Terms|Terms of Payment)[^\n:]*[:]\s*(.+)"),
    ("Payment Info", r"(Payment Method|Payment Mode|Payment Type|Terms)[^\n:]*[:]\s*(.+)"),
    ("Currency", r"(Currency|Curr)[^\n:]*[:]\s*(\w+)"),
    // Amounts
    ("Total Amount", r"(Total Amount|Grand Total|Amount Due|Total|Net Total|Payable Amount)[^\n:]*[:]\s*\$?([0-9\.,]+)"),
    ("Tax Amount", r"(Tax|GST|VAT|IGST|CGST|SGST|Service Tax)[^\n:]*[:]\s*\$?([0-9\.,]+)"),
    ("Advance Payment", r"(Advance Paid|Advance Payment)[^\n:]*[:]\s*\$?([0-9\.,]+)"),
    ("Balance Due", r"(Balance Due|Amount Due)[^\n:]*[:]\s*\$?([0-9\.,]+)"),
    ("Amount in Words", r"(Amount in Words)[^\n:]*[:]\s*(.+)"),
    // Banking
    ("Bank Account", r"(Account No|Bank Account No|A/c No|Account Number)[^\n:]*[:]\s*([A-Z0-9\- ]+)"),
    ("IFSC Code", r"(IFSC Code|Bank IFSC)[^\n:]*[:]\s*([A-Z0-9]+)"),
    ("SWIFT Code", r"(SWIFT Code|SWIFT)[^\n:]*[:]\s*([A-Z0-9]+)"),
    ("IBAN", r"(IBAN|IBAN Number)[^\n:]*[:]\s*([A-Z0-9]+)"),
    // Trade
    ("Country of Origin", r"(Country of Origin)[^\n:]*[:]\s*(.+)"),
    ("Country of Destination", r"(Country of Destination|Destination Country)[^\n:]*[:]\s*(.+)"),
    ("Port of Loading", r"(Port of Loading)[^\n:]*[:]\s*(.+)"),
    ("Port of Discharge", r"(Port of Discharge)[^\n:]*[:]\s*(.+)"),
    // Free text
    ("Remarks", r"(Remarks|Notes|Additional Information)[^\n:]*[:]\s*(.+)"),
    ("Terms and Conditions", r"(Terms and Conditions|Conditions)[^\n:]*[:]\s*(.+)"),
];

lazy_static! {
    // Organizations: capitalized words ending in a company suffix
    pub static ref ORGANIZATION: Regex = Regex::new(
        r"\b([A-Z][A-Za-z&'\-]*(?:[ \t]+(?:[A-Z][A-Za-z&'\-]*|and|&|of))*[ \t]+(?:Pvt\.?[ \t]+Ltd|Ltd|Limited|Inc|LLC|LLP|Corp|Corporation|Company|GmbH|PLC|Group|Industries|Enterprises|Traders|Solutions))\b\.?"
    ).unwrap();

    // Persons: honorific followed by one to three capitalized names
    pub static ref PERSON: Regex = Regex::new(
        r"\b(?:Mr|Mrs|Ms|Miss|Dr|Shri|Smt)\.?[ \t]+([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){0,2})"
    ).unwrap();

    // Locations: "City, ST 12345" style address lines
    pub static ref LOCATION_CITY_STATE: Regex = Regex::new(
        r"\b([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)?),[ \t]+[A-Z]{2}[ \t]+\d{5}\b"
    ).unwrap();

    // Locations: labeled places
    pub static ref LOCATION_LABELED: Regex = Regex::new(
        r"(?i:place of supply|city|country|port of loading|port of discharge)[ \t]*:[ \t]*([A-Z][A-Za-z]+(?:[ \t]+[A-Z][A-Za-z]+)?)"
    ).unwrap();

    // Dates: "31 May 2025", "31st May, 2025"
    pub static ref DATE_DAY_MONTH: Regex = Regex::new(
        r"\b(\d{1,2}(?:st|nd|rd|th)?[ \t]+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\.?,?[ \t]+\d{4})\b"
    ).unwrap();

    // Dates: "May 31, 2025"
    pub static ref DATE_MONTH_DAY: Regex = Regex::new(
        r"\b((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\.?[ \t]+\d{1,2},?[ \t]+\d{4})\b"
    ).unwrap();

    // Dates: numeric forms
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{4}-\d{2}-\d{2}|\d{1,2}[./\-]\d{1,2}[./\-]\d{2,4})\b"
    ).unwrap();

    // Money: currency symbol or code before the amount
    pub static ref MONEY_PREFIXED: Regex = Regex::new(
        r"((?:[$€£₹]|Rs\.?|INR|USD|EUR|GBP)[ \t]?\d[\d,]*(?:\.\d{1,2})?)"
    ).unwrap();

    // Money: currency code or word after the amount
    pub static ref MONEY_SUFFIXED: Regex = Regex::new(
        r"\b(\d[\d,]*(?:\.\d{1,2})?[ \t]?(?:USD|EUR|GBP|INR|dollars|rupees))\b"
    ).unwrap();
}
