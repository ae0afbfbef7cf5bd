//! Gene selection - the ordered list of genes installed in a virus

use crate::catalog::database::GeneDatabase;
use crate::catalog::entity::EntityCatalog;
use crate::catalog::gene::Gene;
use crate::core::error::{Result, SandboxError};
use crate::genome::compiler::{compile, CompiledBlueprint};

/// Genes selected for the next run, in installation order
///
/// Holds owned copies so later catalog edits never change a selection
/// that has already been made.
#[derive(Debug, Clone, Default)]
pub struct GeneSelection {
    genes: Vec<Gene>,
}

impl GeneSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a gene could be installed, without installing it
    pub fn can_add(&self, db: &GeneDatabase, name: &str) -> Result<()> {
        let gene = db
            .get_gene(name)
            .ok_or_else(|| SandboxError::UnknownGene(name.to_string()))?;

        if self.contains(name) {
            return Err(SandboxError::GeneAlreadySelected(name.to_string()));
        }

        let missing: Vec<String> = gene
            .requires
            .iter()
            .filter(|req| !self.contains(req))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SandboxError::MissingPrerequisites {
                gene: name.to_string(),
                missing,
            });
        }

        if gene.is_polymerase {
            if let Some(installed) = self.polymerase_gene() {
                return Err(SandboxError::PolymeraseLimit {
                    gene: name.to_string(),
                    installed: installed.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Install a gene at the end of the selection
    pub fn add(&mut self, db: &GeneDatabase, name: &str) -> Result<()> {
        self.can_add(db, name)?;
        if let Some(gene) = db.get_gene(name) {
            self.genes.push(gene.clone());
        }
        Ok(())
    }

    /// Remove a gene and every selected gene that depends on it
    ///
    /// Returns the names actually removed, dependents first.
    pub fn remove(&mut self, name: &str) -> Vec<String> {
        let mut removed = Vec::new();
        self.remove_into(name, &mut removed);
        removed
    }

    fn remove_into(&mut self, name: &str, removed: &mut Vec<String>) {
        let dependents: Vec<String> = self
            .genes
            .iter()
            .filter(|g| g.requires.iter().any(|r| r == name))
            .map(|g| g.name.clone())
            .collect();

        for dependent in dependents {
            self.remove_into(&dependent, removed);
        }

        if let Some(pos) = self.genes.iter().position(|g| g.name == name) {
            removed.push(self.genes.remove(pos).name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.genes.iter().any(|g| g.name == name)
    }

    /// The installed polymerase gene, if any
    pub fn polymerase_gene(&self) -> Option<&str> {
        self.genes
            .iter()
            .find(|g| g.is_polymerase)
            .map(|g| g.name.as_str())
    }

    pub fn names(&self) -> Vec<String> {
        self.genes.iter().map(|g| g.name.clone()).collect()
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Compile the current selection into a blueprint
    pub fn compile(
        &self,
        starter: &str,
        starting_count: u64,
        catalog: Option<&dyn EntityCatalog>,
    ) -> Result<CompiledBlueprint> {
        compile(starter, starting_count, &self.genes, catalog)
    }
}
