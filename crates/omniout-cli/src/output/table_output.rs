//! Table formatting for record listings
//!
//! Rows are flattened copies of the SDK records so the same shape can be
//! printed as a table or emitted as JSON.

use omniout_sdk::{Account, Contact, Lead, Opportunity};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

const EMPTY: &str = "-";

fn cell(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(EMPTY)
        .to_string()
}

fn print_table<R: Tabled>(rows: Vec<R>) {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

#[derive(Debug, Serialize, Tabled)]
pub struct AccountRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Industry")]
    pub industry: String,
    #[tabled(rename = "Type")]
    pub account_type: String,
    #[tabled(rename = "Phone")]
    pub phone: String,
    #[tabled(rename = "Billing Address")]
    pub billing_address: String,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: cell(&account.id),
            name: cell(&account.name),
            industry: cell(&account.industry),
            account_type: cell(&account.account_type),
            phone: cell(&account.phone),
            billing_address: cell(&account.billing_address()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct ContactRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Phone")]
    pub phone: String,
    #[tabled(rename = "Account")]
    pub account: String,
}

impl From<&Contact> for ContactRow {
    fn from(contact: &Contact) -> Self {
        Self {
            id: cell(&contact.id),
            name: cell(&contact.name),
            title: cell(&contact.title),
            email: cell(&contact.email),
            phone: cell(&contact.phone),
            account: cell(&contact.account.as_ref().and_then(|a| a.name.clone())),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct LeadRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Company")]
    pub company: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Source")]
    pub lead_source: String,
    #[tabled(rename = "Email")]
    pub email: String,
}

impl From<&Lead> for LeadRow {
    fn from(lead: &Lead) -> Self {
        Self {
            id: cell(&lead.id),
            name: cell(&lead.name),
            company: cell(&lead.company),
            status: cell(&lead.status),
            lead_source: cell(&lead.lead_source),
            email: cell(&lead.email),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct OpportunityRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Stage")]
    pub stage: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Probability")]
    pub probability: String,
    #[tabled(rename = "Close Date")]
    pub close_date: String,
}

impl From<&Opportunity> for OpportunityRow {
    fn from(opportunity: &Opportunity) -> Self {
        Self {
            id: cell(&opportunity.id),
            name: cell(&opportunity.name),
            account: cell(&opportunity.account.as_ref().and_then(|a| a.name.clone())),
            stage: cell(&opportunity.stage_name),
            amount: opportunity
                .amount
                .map(format_amount)
                .unwrap_or_else(|| EMPTY.to_string()),
            probability: opportunity
                .probability
                .map(|p| format!("{p:.0}%"))
                .unwrap_or_else(|| EMPTY.to_string()),
            close_date: cell(&opportunity.close_date),
        }
    }
}

/// Whole currency units with thousands separators
fn format_amount(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn account_rows(accounts: &[Account]) -> Vec<AccountRow> {
    accounts.iter().map(AccountRow::from).collect()
}

pub fn contact_rows(contacts: &[Contact]) -> Vec<ContactRow> {
    contacts.iter().map(ContactRow::from).collect()
}

pub fn lead_rows(leads: &[Lead]) -> Vec<LeadRow> {
    leads.iter().map(LeadRow::from).collect()
}

pub fn opportunity_rows(opportunities: &[Opportunity]) -> Vec<OpportunityRow> {
    opportunities.iter().map(OpportunityRow::from).collect()
}

pub fn display_accounts(accounts: &[Account]) {
    print_table(account_rows(accounts));
}

pub fn display_contacts(contacts: &[Contact]) {
    print_table(contact_rows(contacts));
}

pub fn display_leads(leads: &[Lead]) {
    print_table(lead_rows(leads));
}

pub fn display_opportunities(opportunities: &[Opportunity]) {
    print_table(opportunity_rows(opportunities));
}
