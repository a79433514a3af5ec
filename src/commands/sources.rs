use std::path::Path;

use tracing::info;

use super::send_chunked;
use crate::docs::types::KnowledgeBase;
use crate::state::Context;

/// Show which documents are loaded
#[poise::command(slash_command)]
pub async fn sources(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let kb = ctx.data().knowledge.get().await?;
    let mut report = status_report(&kb, ctx.data().knowledge.dir());
    report.push_str(&format!(
        "\n\nConversas ativas: {}",
        ctx.data().sessions.len().await
    ));
    send_chunked(&ctx, &report).await
}

/// Re-read the documents folder (admin only)
#[poise::command(slash_command)]
pub async fn reload(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    if !ctx.data().is_admin(ctx.author().id.get()) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    ctx.defer().await?;
    let summary = ctx.data().knowledge.reload().await?;
    info!(
        user = ctx.author().name,
        doc_count = summary.doc_count,
        changed = summary.changed,
        "Reload requested"
    );

    let change = if summary.changed {
        "conteúdo alterado"
    } else {
        "sem alterações"
    };
    ctx.say(format!(
        "🔄 Base recarregada: {} documento(s), {} ignorado(s), {}.",
        summary.doc_count, summary.skipped_count, change
    ))
    .await?;
    Ok(())
}

fn status_report(kb: &KnowledgeBase, dir: &Path) -> String {
    let mut out = String::from("📂 **Base de Dados**\n");

    if kb.is_empty() {
        out.push_str(&format!("⚠️ Pasta '{}' vazia!\n", dir.display()));
    } else {
        out.push_str(&format!(
            "✅ Docs Carregados ({}) · `{}`\n",
            kb.docs().len(),
            &kb.fingerprint()[..12]
        ));
        for doc in kb.docs() {
            out.push_str(&format!("📄 {} ({} KB)\n", doc.name, doc.size.div_ceil(1024)));
        }
    }

    if !kb.skipped().is_empty() {
        out.push_str("\n**Arquivos ignorados:**\n");
        for skipped in kb.skipped() {
            let name = skipped
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| skipped.path.display().to_string());
            out.push_str(&format!("  - {}: {}\n", name, skipped.reason));
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::types::{LoadedDoc, SkippedFile};
    use std::path::PathBuf;

    #[test]
    fn test_empty_folder_warning() {
        let report = status_report(&KnowledgeBase::default(), Path::new("docs"));
        assert!(report.contains("Pasta 'docs' vazia!"));
        assert!(!report.contains("Docs Carregados"));
    }

    #[test]
    fn test_lists_loaded_and_skipped() {
        let kb = KnowledgeBase::new(
            "=== ARQUIVO: tdah.txt ===\nx\n=== FIM DO ARQUIVO ===\n".to_string(),
            vec![LoadedDoc {
                name: "tdah.txt".to_string(),
                size: 2048,
            }],
            vec![SkippedFile {
                path: PathBuf::from("docs/locked.txt"),
                reason: "permission denied".to_string(),
            }],
        );
        let report = status_report(&kb, Path::new("docs"));
        assert!(report.contains("Docs Carregados (1)"));
        assert!(report.contains("📄 tdah.txt (2 KB)"));
        assert!(report.contains("locked.txt: permission denied"));
        assert!(report.contains(&kb.fingerprint()[..12]));
    }
}
