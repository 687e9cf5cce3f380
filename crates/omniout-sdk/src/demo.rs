//! Offline demo data
//!
//! Enabled with `demo_mode = true`. Queries are answered from a small fixed
//! data set keyed by the object named in the `FROM` clause; writes succeed
//! without touching the network.

use crate::error::CrmResult;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

/// Answer a query statement from the demo data set
pub fn query<T: DeserializeOwned>(statement: &str, limit: u32) -> CrmResult<Vec<T>> {
    let object = object_name(statement).unwrap_or_default();
    debug!("Serving demo records for {:?}", object);

    records_for(&object)
        .into_iter()
        .take(limit as usize)
        .map(|record| serde_json::from_value(record).map_err(Into::into))
        .collect()
}

/// Fabricate an identifier for a created record
pub fn new_id(object_type: &str) -> String {
    let prefix = match object_type.to_ascii_lowercase().as_str() {
        "account" => "001",
        "contact" => "003",
        "opportunity" => "006",
        "lead" => "00Q",
        _ => "a00",
    };
    let suffix = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{prefix}DEMO{}", &suffix[..11])
}

/// Object named after `FROM` in a query statement
fn object_name(statement: &str) -> Option<String> {
    let mut tokens = statement.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("from") {
            return tokens.next().map(|name| name.to_ascii_lowercase());
        }
    }
    None
}

fn records_for(object: &str) -> Vec<Value> {
    match object {
        "account" => vec![
            json!({
                "Id": "001DEMO000000001",
                "Name": "Acme Corporation",
                "Phone": "(415) 555-0100",
                "Website": "https://acme.example.com",
                "BillingStreet": "1 Market St",
                "BillingCity": "San Francisco",
                "BillingState": "CA",
                "BillingPostalCode": "94105",
                "BillingCountry": "USA",
                "Industry": "Manufacturing",
                "Type": "Customer - Direct",
                "NumberOfEmployees": 1200,
            }),
            json!({
                "Id": "001DEMO000000002",
                "Name": "Globex Inc",
                "Phone": "(212) 555-0142",
                "Website": "https://globex.example.com",
                "BillingCity": "New York",
                "BillingState": "NY",
                "BillingCountry": "USA",
                "Industry": "Technology",
                "Type": "Prospect",
                "NumberOfEmployees": 340,
            }),
            json!({
                "Id": "001DEMO000000003",
                "Name": "Initech",
                "Phone": "(512) 555-0199",
                "BillingCity": "Austin",
                "BillingState": "TX",
                "BillingCountry": "USA",
                "Industry": "Consulting",
                "Type": "Customer - Channel",
                "NumberOfEmployees": 85,
            }),
        ],
        "contact" => vec![
            json!({
                "Id": "003DEMO000000001",
                "Name": "Jane Smith",
                "Email": "jane.smith@acme.example.com",
                "Phone": "(415) 555-0101",
                "Title": "VP Operations",
                "Account": { "Name": "Acme Corporation" },
            }),
            json!({
                "Id": "003DEMO000000002",
                "Name": "Raj Patel",
                "Email": "raj.patel@globex.example.com",
                "Phone": "(212) 555-0143",
                "Title": "CTO",
                "Account": { "Name": "Globex Inc" },
            }),
            json!({
                "Id": "003DEMO000000003",
                "Name": "Maria Garcia",
                "Email": "maria.garcia@initech.example.com",
                "Title": "Procurement Manager",
                "Account": { "Name": "Initech" },
            }),
        ],
        "lead" => vec![
            json!({
                "Id": "00QDEMO000000001",
                "Name": "Tom Becker",
                "Company": "Umbrella Logistics",
                "Email": "tom.becker@umbrella.example.com",
                "Phone": "(303) 555-0170",
                "Status": "Open - Not Contacted",
                "LeadSource": "Web",
            }),
            json!({
                "Id": "00QDEMO000000002",
                "Name": "Aiko Tanaka",
                "Company": "Hooli",
                "Email": "aiko.tanaka@hooli.example.com",
                "Status": "Working - Contacted",
                "LeadSource": "Trade Show",
            }),
        ],
        "opportunity" => vec![
            json!({
                "Id": "006DEMO000000001",
                "Name": "Acme - Fleet Renewal",
                "Amount": 125000.0,
                "StageName": "Negotiation/Review",
                "Probability": 80.0,
                "CloseDate": "2026-12-15",
                "Account": { "Name": "Acme Corporation" },
            }),
            json!({
                "Id": "006DEMO000000002",
                "Name": "Globex - Platform Pilot",
                "Amount": 42000.0,
                "StageName": "Qualification",
                "Probability": 20.0,
                "CloseDate": "2027-02-01",
                "Account": { "Name": "Globex Inc" },
            }),
        ],
        _ => Vec::new(),
    }
}
