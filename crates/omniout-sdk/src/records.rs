//! CRM record types
//!
//! Every field except `Id` may be null in the CRM, so they are all
//! optional. Compound or relationship fields (`Name` on contacts and leads,
//! `Account.Name`) are read-only and never serialized into write bodies.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A CRM object type that can be queried and written
pub trait SObject: DeserializeOwned + Serialize + Send {
    /// API name of the object, e.g. `Account`
    const OBJECT_NAME: &'static str;

    /// Fields selected by default
    const FIELDS: &'static [&'static str];

    /// Optional `WHERE` clause applied by default
    const FILTER: Option<&'static str> = None;

    /// Default query statement, without the `LIMIT` clause
    fn select_statement() -> String {
        let mut statement = format!(
            "SELECT {} FROM {}",
            Self::FIELDS.join(", "),
            Self::OBJECT_NAME
        );
        if let Some(filter) = Self::FILTER {
            statement.push_str(" WHERE ");
            statement.push_str(filter);
        }
        statement
    }
}

/// Parent account reference embedded in contacts and opportunities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelatedAccount {
    #[serde(rename = "Name")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_employees: Option<u32>,
}

impl SObject for Account {
    const OBJECT_NAME: &'static str = "Account";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "Name",
        "Phone",
        "Website",
        "BillingStreet",
        "BillingCity",
        "BillingState",
        "BillingPostalCode",
        "BillingCountry",
        "Industry",
        "Type",
        "NumberOfEmployees",
    ];
}

impl Account {
    /// Single-line billing address, skipping empty parts
    pub fn billing_address(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.billing_street,
            &self.billing_city,
            &self.billing_state,
            &self.billing_postal_code,
            &self.billing_country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.trim().is_empty())
        .collect();

        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Contact {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(skip_serializing)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing)]
    pub account: Option<RelatedAccount>,
}

impl SObject for Contact {
    const OBJECT_NAME: &'static str = "Contact";
    const FIELDS: &'static [&'static str] =
        &["Id", "Name", "Email", "Phone", "Title", "Account.Name"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Lead {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(skip_serializing)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<String>,
}

impl SObject for Lead {
    const OBJECT_NAME: &'static str = "Lead";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "Name",
        "Company",
        "Email",
        "Phone",
        "Status",
        "LeadSource",
    ];
    const FILTER: Option<&'static str> = Some("IsConverted = false");
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Opportunity {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<String>,
    #[serde(skip_serializing)]
    pub account: Option<RelatedAccount>,
}

impl SObject for Opportunity {
    const OBJECT_NAME: &'static str = "Opportunity";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "Name",
        "Amount",
        "StageName",
        "Probability",
        "CloseDate",
        "Account.Name",
    ];
    const FILTER: Option<&'static str> = Some("IsClosed = false");
}
