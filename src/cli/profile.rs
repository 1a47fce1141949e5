use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::api::ProfileUpdate;
use crate::cli::account::require_user;
use crate::core::auth::AuthOutcome;
use crate::core::client::ResiliaClient;
use crate::core::profile::load_photo;

#[derive(Args, Debug, Clone, Default)]
pub struct ProfileUpdateArgs {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub surname: Option<String>,
    #[arg(long)]
    pub age: Option<i32>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub goals: Option<String>,
    #[arg(long)]
    pub emergency_contact: Option<String>,
    /// Image file to upload as the profile photo (max 2MB)
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,
}

impl ProfileUpdateArgs {
    pub fn into_update(self) -> Result<ProfileUpdate, Box<dyn Error>> {
        let profile_photo = match &self.photo {
            Some(path) => Some(load_photo(path)?),
            None => None,
        };
        Ok(ProfileUpdate {
            username: self.username,
            name: self.name,
            surname: self.surname,
            age: self.age,
            gender: self.gender,
            bio: self.bio,
            goals: self.goals,
            emergency_contact: self.emergency_contact,
            profile_photo,
        })
    }
}

pub fn show<W: Write>(client: &ResiliaClient, out: &mut W) -> Result<(), Box<dyn Error>> {
    let profile = require_user(client)?.profile;

    writeln!(out, "{}", profile.display_name())?;
    let age = profile.age.map(|age| age.to_string());
    let photo = profile.profile_photo.as_ref().map(|_| "set".to_string());
    let rows = [
        ("Email", profile.email.as_ref()),
        ("Username", profile.username.as_ref()),
        ("Name", profile.name.as_ref()),
        ("Surname", profile.surname.as_ref()),
        ("Age", age.as_ref()),
        ("Gender", profile.gender.as_ref()),
        ("Bio", profile.bio.as_ref()),
        ("Goals", profile.goals.as_ref()),
        ("Emergency contact", profile.emergency_contact.as_ref()),
        ("Photo", photo.as_ref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            writeln!(out, "  {label:<18} {value}")?;
        }
    }
    Ok(())
}

pub async fn update<W: Write>(
    client: &ResiliaClient,
    args: ProfileUpdateArgs,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let update = args.into_update()?;
    if update.is_empty() {
        return Err("Nothing to update. Pass at least one field, e.g. --bio".into());
    }

    match client.auth.update_profile(&update).await {
        AuthOutcome::Success { message } => {
            writeln!(out, "✅ {}", message.unwrap_or_default())?;
            Ok(())
        }
        AuthOutcome::Failure { message } => Err(message.into()),
    }
}
