use crate::error::Result;
use crate::migrate::MigrateContactResponse;
use crate::migrate::report::IdPair;
use crate::store::db::ContactAggregate;
use crate::store::entity::ContactAddress;
use clap::ValueEnum;
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

fn pair_line(pair: &IdPair) -> String {
    format!(
        "{:<30} {:>10} -> {}",
        pair.element_type, pair.source_id, pair.destination_id
    )
}

fn address_line(address: &ContactAddress) -> String {
    let parts: Vec<&str> = [
        &address.flat,
        &address.property,
        &address.street,
        &address.city,
        &address.postcode,
    ]
    .into_iter()
    .filter_map(|part| part.as_deref())
    .collect();
    parts.join(", ")
}

pub fn print_report(report: &MigrateContactResponse, replaced: bool, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            let verb = if replaced { "Replaced" } else { "Migrated" };
            println!(
                "{} contact {} ({})",
                verb.green().bold(),
                report.contact.source_id,
                report.last_name
            );
            if let Some(dob) = report.date_of_birth {
                println!("  {} {}", "born:".dimmed(), dob);
            }
            println!("  {} {}", "phones:".dimmed(), report.phone_numbers.len());
            println!("  {} {}", "addresses:".dimmed(), report.addresses.len());
            println!("  {} {}", "emails:".dimmed(), report.emails.len());
            println!("  {} {}", "identities:".dimmed(), report.identities.len());
            println!("  {} {}", "restrictions:".dimmed(), report.restrictions.len());
            println!("  {} {}", "employments:".dimmed(), report.employments.len());
            println!("  {} {}", "relationships:".dimmed(), report.relationships.len());
            for entry in report.entries().iter().skip(1) {
                println!("    {}", pair_line(entry));
            }
        }
        Format::Minimal => {
            for entry in report.entries() {
                println!("{}", pair_line(&entry));
            }
        }
    }
    Ok(())
}

pub fn print_aggregate(aggregate: &ContactAggregate, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(aggregate)?),
        Format::Pretty => {
            let c = &aggregate.contact;
            println!(
                "[{}] {}, {}",
                c.contact_id.to_string().cyan().bold(),
                c.last_name,
                c.first_name
            );
            if let Some(dob) = c.date_of_birth {
                println!("  {} {}", "born:".dimmed(), dob);
            }
            if c.deceased {
                let date = c.deceased_date.map(|d| d.to_string());
                println!("  {} {}", "deceased:".dimmed(), date.as_deref().unwrap_or("yes"));
            }
            for phone in &aggregate.phones {
                println!(
                    "  {} [{}] {} {}",
                    "phone".dimmed(),
                    phone.contact_phone_id,
                    phone.phone_type,
                    phone.phone_number
                );
            }
            for address in &aggregate.addresses {
                println!(
                    "  {} [{}] {}",
                    "address".dimmed(),
                    address.contact_address_id,
                    address_line(address)
                );
            }
            for email in &aggregate.emails {
                println!(
                    "  {} [{}] {}",
                    "email".dimmed(),
                    email.contact_email_id,
                    email.email_address
                );
            }
            for restriction in &aggregate.restrictions {
                println!(
                    "  {} [{}] {}",
                    "restriction".dimmed(),
                    restriction.contact_restriction_id,
                    restriction.restriction_type
                );
            }
            for rel in &aggregate.relationships {
                println!(
                    "  {} [{}] {} {} ({})",
                    "prisoner".dimmed(),
                    rel.prisoner_contact_id,
                    rel.prisoner_number,
                    rel.relationship_type,
                    rel.contact_type
                );
            }
        }
        Format::Minimal => {
            let c = &aggregate.contact;
            println!(
                "{:>10} {:20} {:20} {:>3} {:>3} {:>3}",
                c.contact_id,
                truncate(&c.last_name, 20),
                truncate(&c.first_name, 20),
                aggregate.phones.len(),
                aggregate.addresses.len(),
                aggregate.relationships.len()
            );
        }
    }
    Ok(())
}

pub fn print_removed(contact_id: i64, format: Format) -> Result<()> {
    match format {
        Format::Json => println!(
            "{}",
            serde_json::to_string(&serde_json::json!({ "removed": contact_id }))?
        ),
        Format::Pretty => println!("{} contact {}", "Removed".red().bold(), contact_id),
        Format::Minimal => println!("{}", contact_id),
    }
    Ok(())
}

pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
