//! JavaScript integration script generation.
//!
//! The script rebuilds a subset of the document through the runtime's
//! `MadBuilder` API. Values reach the output through exactly two paths:
//! [`js_string`] for quoted strings and [`escape_template_literal`] for
//! backtick literals.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use madforge_shared::{MadDocument, MadError, Result};

use crate::writer::write_atomic;

pub const SCRIPT_FILE_NAME: &str = "create_mad_document.js";

pub const MAX_SCRIPT_EMBEDDINGS: usize = 5;
pub const MAX_SCRIPT_ENTITIES: usize = 10;
pub const MAX_SCRIPT_RELATIONSHIPS: usize = 10;

const RUNTIME_MODULE: &str = "../pkg/mad_runtime.js";

/// Escape text for a JavaScript template literal body.
pub fn escape_template_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// A double-quoted JavaScript string literal.
pub fn js_string(text: &str) -> Result<String> {
    Ok(serde_json::to_string(text)?)
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulates indented script lines.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    out: String,
    indent: usize,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, code: impl AsRef<str>) -> &mut Self {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(code.as_ref());
        self.out.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        self.line(format!("// {text}"))
    }

    /// Open a block: emits `header {` and indents.
    pub fn open(&mut self, header: &str) -> &mut Self {
        self.line(format!("{header} {{"));
        self.indent += 1;
        self
    }

    /// Close the innermost block.
    pub fn close(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self.line("}")
    }

    /// Emit a template literal assignment. The body is written verbatim after
    /// escaping, without indentation, so multi-line content is preserved.
    pub fn template_const(&mut self, name: &str, call: &str, body: &str) -> &mut Self {
        self.line(format!(
            "const {name} = {call}(`{}`);",
            escape_template_literal(body)
        ))
    }

    pub fn finish(self) -> String {
        self.out
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate the integration script for `doc`.
pub fn generate_script(doc: &MadDocument) -> Result<String> {
    let mut b = ScriptBuilder::new();

    b.comment("Generated by MadForge. Recreates this document with the MAD runtime.")
        .line(format!(
            "import init, {{ MadBuilder, McpServer }} from {};",
            js_string(RUNTIME_MODULE)?
        ))
        .blank()
        .open("async function createMadDocument()")
        .line("await init();")
        .blank()
        .line(format!(
            "const builder = new MadBuilder({}, {});",
            js_string(&doc.metadata.title)?,
            js_string(&doc.metadata.author)?
        ))
        .blank()
        .template_const("htmlContentId", "builder.add_html_content", &doc.content.html)
        .template_const(
            "markdownContentId",
            "builder.add_markdown_content",
            &doc.content.markdown,
        );

    if !doc.embeddings.is_empty() {
        b.blank().comment("Vector embeddings");
        for record in doc.embeddings.values().take(MAX_SCRIPT_EMBEDDINGS) {
            b.line(format!(
                "builder.add_vector_embedding(htmlContentId, {});",
                serde_json::to_string(&record.embedding)?
            ));
        }
    }

    if !doc.entities.is_empty() {
        b.blank().comment("Entities");
        for (id, entity) in doc.entities.iter().take(MAX_SCRIPT_ENTITIES) {
            let properties = serde_json::json!({
                "text": entity.text,
                "label": entity.label,
                "description": entity.description.as_deref().unwrap_or_default(),
            });
            b.line(format!(
                "builder.create_entity({}, {}, {});",
                js_string(id)?,
                js_string(&entity.label)?,
                js_string(&properties.to_string())?
            ));
        }
    }

    if !doc.relationships.is_empty() {
        b.blank().comment("Relationships");
        for rel in doc.relationships.values().take(MAX_SCRIPT_RELATIONSHIPS) {
            let properties = serde_json::json!({
                "type": rel.kind.as_str(),
                "distance": rel.distance,
                "confidence": rel.confidence,
            });
            b.line(format!(
                "builder.create_relationship({}, {}, {}, {});",
                js_string(&rel.from)?,
                js_string(&rel.to)?,
                js_string(rel.kind.as_str())?,
                js_string(&properties.to_string())?
            ));
        }
    }

    b.blank()
        .line("builder.build();")
        .line("const document = builder.get_document();")
        .blank()
        .line("const mcpServer = new McpServer();")
        .line("mcpServer.set_document(document);")
        .blank()
        .line("console.log(\"Content hash:\", document.calculate_content_hash());")
        .line(format!(
            "console.log(\"Document ID:\", {});",
            js_string(&doc.document_id.to_string())?
        ))
        .blank()
        .line("return { document, mcpServer, builder };")
        .close()
        .blank()
        .line("export { createMadDocument };")
        .blank()
        .open("if (typeof window !== \"undefined\")")
        .line("window.createMadDocument = createMadDocument;")
        .close();

    Ok(b.finish())
}

/// Generate the script and write it to `dir/create_mad_document.js`.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_script(doc: &MadDocument, dir: &Path) -> Result<PathBuf> {
    let script = generate_script(doc)?;
    std::fs::create_dir_all(dir).map_err(|e| MadError::io(dir, e))?;
    let path = write_atomic(dir, SCRIPT_FILE_NAME, script.as_bytes())?;
    debug!(size = script.len(), "integration script written");
    Ok(path)
}
