//! Command implementations for the CLI.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};

use crate::cli::{AckArgs, Command, DownloadArgs, ShowArgs, UploadArgs};
use crate::models::{DocumentDetail, DocumentId, UploadForm};
use crate::preview::{PageImage, RenderOutcome};
use crate::workflow::{DashboardView, DocumentWorkflow, OpenedPreview, SubmitOutcome};

pub async fn run(command: Command, workflow: &DocumentWorkflow) -> Result<()> {
    match command {
        Command::List => run_list(workflow).await,
        Command::Show(args) => run_show(&args, workflow).await,
        Command::Ack(args) => run_ack(&args, workflow).await,
        Command::Upload(args) => run_upload(&args, workflow).await,
        Command::Download(args) => run_download(&args, workflow).await,
        Command::Delete { id } => run_delete(id, workflow).await,
    }
}

async fn load_dashboard(workflow: &DocumentWorkflow) -> Result<DashboardView> {
    let view = workflow.start().await;
    if workflow.store().documents().is_none() {
        bail!("could not load documents (see log for details)");
    }
    Ok(view)
}

async fn open(workflow: &DocumentWorkflow, id: DocumentId) -> Result<OpenedPreview> {
    load_dashboard(workflow).await?;
    workflow
        .open(id)
        .await
        .with_context(|| format!("failed to load document {id}"))?
        .ok_or_else(|| anyhow!("document {id} was superseded by another selection"))
}

async fn run_list(workflow: &DocumentWorkflow) -> Result<()> {
    let view = load_dashboard(workflow).await?;
    print!("{}", format_dashboard(&view));
    Ok(())
}

async fn run_show(args: &ShowArgs, workflow: &DocumentWorkflow) -> Result<()> {
    let preview = open(workflow, args.id).await?;
    print!("{}", format_detail(&preview.detail));

    let outcome = preview.render.await.context("preview task panicked")?;
    match outcome {
        RenderOutcome::Completed { pages } => {
            println!("Preview: {pages} page(s) rendered");
        }
        RenderOutcome::Cancelled { rendered } => {
            println!("Preview cancelled after {rendered} page(s)");
        }
        RenderOutcome::Failed(e) => {
            tracing::warn!(error = %e, "Preview failed");
            println!("{}", crate::preview::PREVIEW_FAILED_MESSAGE);
            return Ok(());
        }
    }

    if let Some(dir) = &args.output_dir {
        let pages = match workflow.render_area() {
            crate::preview::RenderArea::Pages { pages, .. } => pages,
            _ => Vec::new(),
        };
        write_pages(dir, preview.detail.id, &pages).await?;
        println!("Wrote {} page(s) to {}", pages.len(), dir.display());
    }
    Ok(())
}

async fn run_ack(args: &AckArgs, workflow: &DocumentWorkflow) -> Result<()> {
    let preview = open(workflow, args.id).await?;
    let controller = workflow.acknowledgment();

    controller.toggle_checked(args.confirm)?;
    if !controller.gate().submit_enabled() {
        bail!(
            "acknowledging '{}' requires --confirm after reviewing it",
            preview.detail.filename
        );
    }

    match controller.submit().await? {
        SubmitOutcome::Done | SubmitOutcome::Detached => {
            println!("Acknowledged '{}'", preview.detail.filename);
        }
    }
    print!("{}", format_dashboard(&workflow.dashboard()));
    Ok(())
}

async fn run_upload(args: &UploadArgs, workflow: &DocumentWorkflow) -> Result<()> {
    let form = UploadForm::from_path(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?
        .with_special_requirements(args.requirements.clone());

    workflow
        .upload(&form)
        .await
        .with_context(|| format!("upload of '{}' failed", form.filename))?;
    println!("Uploaded '{}'", form.filename);
    Ok(())
}

async fn run_download(args: &DownloadArgs, workflow: &DocumentWorkflow) -> Result<()> {
    let output = match &args.output {
        Some(path) => path.clone(),
        None => {
            let documents = load_dashboard(workflow).await?.all;
            let card = documents
                .iter()
                .find(|card| card.id == args.id)
                .ok_or_else(|| anyhow!("document {} is not in the document list", args.id))?;
            // stored documents are always PDF; keep only the final path component
            let name = Path::new(&card.filename)
                .file_name()
                .ok_or_else(|| anyhow!("document {} has no usable file name", args.id))?;
            PathBuf::from(name).with_extension("pdf")
        }
    };

    let bytes = workflow
        .download(args.id)
        .await
        .with_context(|| format!("failed to download document {}", args.id))?;
    if let Some(dir) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Saved document {} to {}", args.id, output.display());
    Ok(())
}

async fn run_delete(id: DocumentId, workflow: &DocumentWorkflow) -> Result<()> {
    workflow
        .delete(id)
        .await
        .with_context(|| format!("failed to delete document {id}"))?;
    println!("Deleted document {id}");
    Ok(())
}

async fn write_pages(dir: &Path, id: DocumentId, pages: &[PageImage]) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;
    for page in pages {
        let path = dir.join(format!("document-{id}-page-{:03}.png", page.number));
        tokio::fs::write(&path, &page.png)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

pub fn format_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();

    if view.show_pending {
        let _ = writeln!(out, "Pending your acknowledgment ({}):", view.pending.len());
        for card in &view.pending {
            let _ = writeln!(out, "  #{:<5} {}", card.id, card.filename);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "All documents ({}):", view.all.len());
    for card in &view.all {
        let _ = writeln!(
            out,
            "  #{:<5} {:<40} {:<16} [{}]",
            card.id, card.filename, card.uploader, card.badge.label
        );
    }
    out
}

pub fn format_detail(detail: &DocumentDetail) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", detail.filename, detail.id);
    if !detail.uploader.is_empty() {
        let _ = writeln!(out, "Uploaded by: {}", detail.uploader);
    }
    let _ = writeln!(out, "Special requirements: {}", detail.special_requirements);

    let _ = writeln!(out, "Acknowledged By:");
    for user in &detail.signed_by {
        let _ = writeln!(out, "  - {}", user.username);
    }
    let _ = writeln!(out, "Awaiting Acknowledgment:");
    for user in &detail.not_signed_by {
        let _ = writeln!(out, "  - {}", user.username);
    }
    out
}
