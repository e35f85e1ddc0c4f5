//! `kindred knowledge ...`

use std::path::PathBuf;

use clap::Subcommand;

use crate::api::models::CreateKnowledgeBaseRequest;
use crate::cli::context::CliContext;
use crate::cli::error::{CliError, CliResult};
use crate::cli::prompt::confirm;

#[derive(Subcommand, Debug)]
pub enum KnowledgeCommands {
    /// List a character's knowledge bases
    List { character_id: String },
    Create {
        character_id: String,
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// List documents in a knowledge base
    Documents { knowledge_base_id: String },
    /// Upload a file into a knowledge base
    Upload {
        knowledge_base_id: String,
        #[arg(value_name = "PATH")]
        file: PathBuf,
    },
    /// Remove one document
    RemoveDocument {
        knowledge_base_id: String,
        document_id: String,
    },
}

pub async fn run(ctx: &CliContext, command: KnowledgeCommands) -> CliResult {
    ctx.require_session()?;
    let api = &ctx.api;

    match command {
        KnowledgeCommands::List { character_id } => {
            let bases = api.knowledge_bases(&character_id).await?;
            if bases.is_empty() {
                println!("No knowledge bases for {character_id}.");
            }
            for base in bases {
                println!("  • {} ({}, {} documents)", base.name, base.id, base.document_count);
                if !base.description.is_empty() {
                    println!("    {}", base.description);
                }
            }
        }
        KnowledgeCommands::Create {
            character_id,
            name,
            description,
        } => {
            let request = CreateKnowledgeBaseRequest {
                character_id,
                name,
                description,
            };
            let base = api.create_knowledge_base(&request).await?;
            println!("✅ Created knowledge base {} ({})", base.name, base.id);
        }
        KnowledgeCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete knowledge base {id} and its documents?"))? {
                println!("Cancelled");
                return Ok(());
            }
            api.delete_knowledge_base(&id).await?;
            println!("✅ Deleted knowledge base {id}");
        }
        KnowledgeCommands::Documents { knowledge_base_id } => {
            let documents = api.documents(&knowledge_base_id).await?;
            if documents.is_empty() {
                println!("No documents yet.");
            }
            for document in documents {
                println!(
                    "  • {} ({}, {}, {} chunks)",
                    document.title, document.id, document.file_type, document.chunk_count
                );
            }
        }
        KnowledgeCommands::Upload {
            knowledge_base_id,
            file,
        } => {
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| CliError::usage(format!("Not a file: {}", file.display())))?
                .to_string();
            let bytes = std::fs::read(&file)?;
            let document = api
                .upload_document(&knowledge_base_id, &file_name, bytes)
                .await?;
            println!(
                "✅ Uploaded {} as {} ({} chunks)",
                file_name, document.id, document.chunk_count
            );
        }
        KnowledgeCommands::RemoveDocument {
            knowledge_base_id,
            document_id,
        } => {
            api.delete_document(&knowledge_base_id, &document_id).await?;
            println!("✅ Removed document {document_id}");
        }
    }
    Ok(())
}
