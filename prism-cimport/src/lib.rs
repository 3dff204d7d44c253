//! prism-cimport — C header → Prism declaration importer.
//!
//! Feeds a module header through the external C front-end, walks the JSON
//! AST dump, and emits two Prism source files: the declarations module
//! (`<name>.pr`) and its runtime symbol table (`<name>_sym.pr`).
//!
//! # Quick start
//!
//! Import every configured module (suitable for the build driver):
//!
//! ```no_run
//! use std::path::Path;
//!
//! // Reads cimport.toml, runs the front-end, writes the .pr files.
//! prism_cimport::run(Path::new("cimport.toml"), None).unwrap();
//! ```

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub mod ast;
pub mod config;
pub mod emit;
pub mod extract;
pub mod frontend;
pub mod grammar;
pub mod model;
pub mod platform;
pub mod prelude;
pub mod symbols;

use ast::Node;
use config::{Config, ModuleConfig};
use model::{Declaration, ImportContext};
use platform::Platform;

/// Run the full pipeline: load config, import every module enabled on the
/// host platform, and write the output files.
///
/// `config_path` is the path to a `cimport.toml` file.
/// `only` restricts the run to a single module name.
pub fn run(config_path: &Path, only: Option<&str>) -> Result<()> {
    let cfg = config::load_config(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let mut importer = Importer::new(Platform::host());
    for module in &cfg.module {
        if let Some(only) = only
            && module.name != only
        {
            continue;
        }
        if !module.enabled_on(importer.platform) {
            info!(module = %module.name, "skipping (platform gated)");
            continue;
        }
        importer
            .import_module(&cfg, module, base_dir)
            .with_context(|| format!("importing module `{}`", module.name))?;
    }
    Ok(())
}

/// The module orchestrator. Holds the cross-module state: a name declared
/// by an earlier module suppresses its redefinition in later ones.
pub struct Importer {
    pub platform: Platform,
    all_definitions: HashSet<String>,
}

impl Importer {
    pub fn new(platform: Platform) -> Self {
        Importer {
            platform,
            all_definitions: HashSet::new(),
        }
    }

    /// Import one module end to end: enumerate library exports, run the
    /// front-end, scan exclusion directives, and write both output files.
    pub fn import_module(
        &mut self,
        cfg: &Config,
        module: &ModuleConfig,
        base_dir: &Path,
    ) -> Result<()> {
        let symbol_filter = self.library_exports(module)?;

        let header_dir = base_dir.join(&cfg.header_dir);
        let header = header_dir.join(format!("{}.h", module.name));
        let out_dir = header_dir.join(self.platform.name());
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating {}", out_dir.display()))?;

        let json_path = out_dir.join(format!("{}.json", module.name));
        frontend::dump_ast(
            self.platform,
            cfg.frontend.as_deref(),
            &header,
            &cfg.include_paths,
            &json_path,
        )?;
        let nodes = frontend::load_ast(&json_path)?;
        let excluded = frontend::scan_exclusions(&header)?;

        let decls_path = out_dir.join(format!("{}.pr", module.name));
        let syms_path = out_dir.join(format!("{}_sym.pr", module.name));
        let mut decls = BufWriter::new(
            File::create(&decls_path)
                .with_context(|| format!("creating {}", decls_path.display()))?,
        );
        let mut syms = BufWriter::new(
            File::create(&syms_path)
                .with_context(|| format!("creating {}", syms_path.display()))?,
        );

        self.process_ast(
            &module.name,
            &nodes,
            &excluded,
            symbol_filter.as_ref(),
            &mut decls,
            &mut syms,
        )?;
        decls.flush()?;
        syms.flush()?;

        info!(
            module = %module.name,
            declarations = %decls_path.display(),
            symbols = %syms_path.display(),
            "module imported"
        );
        Ok(())
    }

    /// The in-memory import stage: walk the AST, apply exclusions and
    /// cross-module deduplication, and write both outputs.
    pub fn process_ast(
        &mut self,
        module: &str,
        nodes: &[Node],
        excluded: &HashSet<String>,
        symbol_filter: Option<&HashSet<String>>,
        decls_out: &mut dyn Write,
        symbols_out: &mut dyn Write,
    ) -> Result<()> {
        let mut ctx = ImportContext::new(self.platform);
        extract::walk(&mut ctx, nodes)?;

        // Names excluded by directive or already owned by an earlier module
        // are dropped; the survivors claim their names process-wide.
        let survivors: Vec<Declaration> = ctx
            .globals
            .iter()
            .filter(|(name, _)| !excluded.contains(*name) && !self.all_definitions.contains(*name))
            .map(|(_, decl)| decl.clone())
            .collect();
        for decl in &survivors {
            self.all_definitions.insert(decl.name().to_string());
        }

        info!(
            module,
            declarations = survivors.len(),
            dropped = ctx.globals.len() - survivors.len(),
            "walk complete"
        );

        emit::write_declarations(&ctx, &survivors, decls_out)?;
        emit::write_symbols(module, &survivors, symbol_filter, symbols_out)?;
        Ok(())
    }

    /// Union of the exported symbols of the module's libraries; `None` when
    /// the module names no libraries (no filtering).
    fn library_exports(&self, module: &ModuleConfig) -> Result<Option<HashSet<String>>> {
        if module.libs.is_empty() {
            return Ok(None);
        }
        let mut exports = HashSet::new();
        for lib in &module.libs {
            exports.extend(
                symbols::exported_symbols(lib)
                    .with_context(|| format!("enumerating exports of {lib}"))?,
            );
        }
        // An empty union means no enumerator ran on this platform; emit
        // everything rather than nothing.
        Ok((!exports.is_empty()).then_some(exports))
    }
}
