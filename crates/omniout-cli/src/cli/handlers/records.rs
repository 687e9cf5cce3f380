//! Record command handlers

use crate::cli::commands::{AccountFields, ContactFields, LeadFields, ListOptions};
use crate::context::AppContext;
use crate::error::{CliError, Result};
use crate::output::table_output::{
    account_rows, contact_rows, display_accounts, display_contacts, display_leads,
    display_opportunities, lead_rows, opportunity_rows,
};
use crate::output::{create_spinner, json_output, print_info, print_success, print_warning};
use omniout_sdk::{Account, Contact, CrmError, Lead, Opportunity, SObject};
use serde_json::json;
use tracing::error;

/// Reads never fail the command: errors are reported and yield no rows
async fn fetch<T: SObject>(ctx: &AppContext, options: &ListOptions) -> Result<Vec<T>> {
    let spinner = create_spinner(&format!("Fetching {} records...", T::OBJECT_NAME));
    let result = ctx
        .client
        .try_query::<T>(&T::select_statement(), options.limit)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(records) => Ok(records),
        Err(e) => {
            error!("Failed to fetch {} records: {}", T::OBJECT_NAME, e);
            if e.is_authentication_error() {
                print_warning(&e.to_string());
            } else {
                print_warning(&format!(
                    "Could not load {} records: {e}",
                    T::OBJECT_NAME
                ));
            }
            Ok(Vec::new())
        }
    }
}

/// Handle accounts command
pub async fn handle_accounts(ctx: &AppContext, options: ListOptions, json: bool) -> Result<()> {
    let accounts: Vec<Account> = fetch(ctx, &options).await?;
    if json {
        json_output(&account_rows(&accounts))
    } else if accounts.is_empty() {
        print_info("No accounts found");
        Ok(())
    } else {
        display_accounts(&accounts);
        Ok(())
    }
}

/// Handle contacts command
pub async fn handle_contacts(ctx: &AppContext, options: ListOptions, json: bool) -> Result<()> {
    let contacts: Vec<Contact> = fetch(ctx, &options).await?;
    if json {
        json_output(&contact_rows(&contacts))
    } else if contacts.is_empty() {
        print_info("No contacts found");
        Ok(())
    } else {
        display_contacts(&contacts);
        Ok(())
    }
}

/// Handle leads command
pub async fn handle_leads(ctx: &AppContext, options: ListOptions, json: bool) -> Result<()> {
    let leads: Vec<Lead> = fetch(ctx, &options).await?;
    if json {
        json_output(&lead_rows(&leads))
    } else if leads.is_empty() {
        print_info("No open leads found");
        Ok(())
    } else {
        display_leads(&leads);
        Ok(())
    }
}

/// Handle opportunities command
pub async fn handle_opportunities(
    ctx: &AppContext,
    options: ListOptions,
    json: bool,
) -> Result<()> {
    let opportunities: Vec<Opportunity> = fetch(ctx, &options).await?;
    if json {
        json_output(&opportunity_rows(&opportunities))
    } else if opportunities.is_empty() {
        print_info("No open opportunities found");
        Ok(())
    } else {
        display_opportunities(&opportunities);
        Ok(())
    }
}

/// Handle create-account command
pub async fn handle_create_account(
    ctx: &AppContext,
    fields: AccountFields,
    json: bool,
) -> Result<()> {
    let spinner = create_spinner("Creating account...");
    let result = ctx.client.create_account(&fields.into()).await;
    spinner.finish_and_clear();

    report_created("account", &result?, json)
}

/// Handle create-lead command
pub async fn handle_create_lead(ctx: &AppContext, fields: LeadFields, json: bool) -> Result<()> {
    let spinner = create_spinner("Creating lead...");
    let result = ctx.client.create_lead(&fields.into()).await;
    spinner.finish_and_clear();

    report_created("lead", &result?, json)
}

/// Handle update-contact command
pub async fn handle_update_contact(ctx: &AppContext, id: &str, fields: ContactFields) -> Result<()> {
    if fields.is_empty() {
        return Err(CliError::InvalidInput(
            "Nothing to update; pass at least one field, e.g. --title".to_string(),
        ));
    }
    if !ctx.client.is_demo() && !ctx.client.is_authenticated().await {
        return Err(CrmError::NotAuthenticated.into());
    }

    let spinner = create_spinner("Updating contact...");
    let updated = ctx.client.update_contact(id, &fields.into()).await;
    spinner.finish_and_clear();

    if updated {
        print_success(&format!("Updated contact {id}"));
        Ok(())
    } else {
        Err(CliError::internal(format!(
            "Failed to update contact {id}; run with -v for details"
        )))
    }
}

fn report_created(kind: &str, id: &str, json: bool) -> Result<()> {
    if json {
        json_output(&json!({ "id": id }))
    } else {
        print_success(&format!("Created {kind} {id}"));
        Ok(())
    }
}
