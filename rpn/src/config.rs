//! Pipeline configuration format.

use crate::{
    anchor::{AnchorGenerator, AnchorGeneratorInit},
    common::*,
    labeler::{AnchorLabeler, AnchorLabelerInit},
    propose::{ProposalSelector, ProposalSelectorInit},
};

/// The region proposal configuration.
///
/// Every section falls back to its defaults when omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub anchor: AnchorGeneratorInit,
    pub labeler: AnchorLabelerInit,
    pub proposal: ProposalSelectorInit,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let config = json5::from_str(&text)
            .with_context(|| format!("unable to parse {}", path.display()))?;
        Ok(config)
    }

    /// Validate every section and build the runtime components.
    pub fn build(self) -> Result<RegionProposal> {
        let Self {
            anchor,
            labeler,
            proposal,
        } = self;

        let generator = anchor.build()?;
        let labeler = labeler.build()?;
        let selector = proposal.build(&generator)?;

        Ok(RegionProposal {
            generator,
            labeler,
            selector,
        })
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(json5::from_str(text)?)
    }
}

/// Validated components built from a [Config].
#[derive(Debug, Clone)]
pub struct RegionProposal {
    pub generator: AnchorGenerator,
    pub labeler: AnchorLabeler,
    pub selector: ProposalSelector,
}
