use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::{Map, Value};
use users_sdk::{
    CreateUserRequest, SendNewPasswordRequest, UpdateUserRequest, UserIds, UserPatch,
    UsersClientV1,
};

#[derive(Subcommand)]
pub enum Command {
    /// List all users
    List,
    /// Create a user
    Create(CreateArgs),
    /// Update fields of a user
    Update(UpdateArgs),
    /// Delete a single user
    Delete { id: String },
    /// Deactivate several users at once
    Deactivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Reactivate several users at once
    Reactivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Ask the backend for a generated password
    GeneratePassword,
    /// Email a new password to a user
    SendNewPassword {
        #[arg(long)]
        email: String,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    password: Option<String>,
    /// Extra field as `key=value`; JSON values are parsed, anything else is a string
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, Value)>,
}

#[derive(Args)]
pub struct UpdateArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, Value)>,
}

impl Command {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::List => "list",
            Command::Create(_) => "create",
            Command::Update(_) => "update",
            Command::Delete { .. } => "delete",
            Command::Deactivate { .. } => "deactivate",
            Command::Reactivate { .. } => "reactivate",
            Command::GeneratePassword => "generate-password",
            Command::SendNewPassword { .. } => "send-new-password",
        }
    }

    pub async fn run(self, client: &dyn UsersClientV1) -> anyhow::Result<Value> {
        let output = match self {
            Command::List => serde_json::to_value(&*client.get_users().await?)?,
            Command::Create(args) => {
                let req = CreateUserRequest {
                    email: args.email,
                    name: args.name,
                    password: args.password,
                    extra: into_map(args.fields),
                };
                serde_json::to_value(client.create_user(req).await?)?
            }
            Command::Update(args) => {
                let patch = UserPatch {
                    name: args.name,
                    email: args.email,
                    password: args.password,
                    extra: into_map(args.fields),
                };
                anyhow::ensure!(!patch.is_empty(), "nothing to update");
                let update = client
                    .update_user(UpdateUserRequest::new(args.id, patch))
                    .await?;
                serde_json::to_value(update)?
            }
            Command::Delete { id } => serde_json::to_value(
                client
                    .delete_user(&id)
                    .await
                    .with_context(|| format!("deleting user {id}"))?,
            )?,
            Command::Deactivate { ids } => {
                let count = ids.len();
                client.delete_users(UserIds { ids }).await?;
                tracing::info!(count, "users deactivated");
                serde_json::json!({ "deactivated": count })
            }
            Command::Reactivate { ids } => {
                let count = ids.len();
                client.reactivate_users(UserIds { ids }).await?;
                tracing::info!(count, "users reactivated");
                serde_json::json!({ "reactivated": count })
            }
            Command::GeneratePassword => client.generate_password().await?.0,
            Command::SendNewPassword { email } => serde_json::to_value(
                client
                    .send_new_password(SendNewPasswordRequest::new(email))
                    .await?,
            )?,
        };
        Ok(output)
    }
}

fn into_map(fields: Vec<(String, Value)>) -> Map<String, Value> {
    fields.into_iter().collect()
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}
