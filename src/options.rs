//! Method choices of an analysis
use crate::library::Importance;
use crate::ora::OraMethod;
use crate::qea::QeaMethod;
use crate::{CompoundSet, PseaResult};

/// Configuration of an [`crate::AnalysisContext`]
///
/// The default runs the hypergeometric test for ORA, the global test for
/// QEA, weights hits by relative betweenness centrality and uses the whole
/// library as background.
///
/// # Examples
///
/// ```
/// use psea::{AnalysisOptions, Importance};
/// use psea::ora::OraMethod;
///
/// let options = AnalysisOptions::default()
///     .with_importance(Importance::Degree)
///     .with_ora_method("fisher".parse::<OraMethod>().unwrap());
/// assert_eq!(options.importance(), Importance::Degree);
/// assert_eq!(options.ora_method(), OraMethod::Fisher);
/// assert!(options.reference().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisOptions {
    ora_method: OraMethod,
    qea_method: QeaMethod,
    importance: Importance,
    reference: Option<CompoundSet>,
}

impl AnalysisOptions {
    /// Parses the options from their short names, e.g. `hyperg`, `gt` and `rbc`
    ///
    /// # Errors
    ///
    /// [`crate::PseaError::InvalidOption`] if any name is unknown
    pub fn parse(ora_method: &str, qea_method: &str, importance: &str) -> PseaResult<Self> {
        Ok(Self {
            ora_method: ora_method.parse()?,
            qea_method: qea_method.parse()?,
            importance: importance.parse()?,
            reference: None,
        })
    }

    /// The ORA test
    pub fn ora_method(&self) -> OraMethod {
        self.ora_method
    }

    /// The QEA group test
    pub fn qea_method(&self) -> QeaMethod {
        self.qea_method
    }

    /// The topology metric of the impact score
    pub fn importance(&self) -> Importance {
        self.importance
    }

    /// The reference metabolome, if any
    pub fn reference(&self) -> Option<&CompoundSet> {
        self.reference.as_ref()
    }

    /// Sets the ORA test
    pub fn with_ora_method(mut self, method: OraMethod) -> Self {
        self.ora_method = method;
        self
    }

    /// Sets the QEA group test
    pub fn with_qea_method(mut self, method: QeaMethod) -> Self {
        self.qea_method = method;
        self
    }

    /// Sets the topology metric
    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    /// Restricts the library to the compounds of a reference metabolome
    ///
    /// An empty reference is the same as no reference.
    pub fn with_reference(mut self, reference: CompoundSet) -> Self {
        self.reference = Some(reference);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let options = AnalysisOptions::default();
        assert_eq!(options.ora_method(), OraMethod::Hypergeometric);
        assert_eq!(options.qea_method(), QeaMethod::GlobalTest);
        assert_eq!(options.importance(), Importance::Betweenness);
        assert!(options.reference().is_none());
    }

    #[test]
    fn parse_short_names() {
        let options = AnalysisOptions::parse("fisher", "ga", "dgr").unwrap();
        assert_eq!(options.ora_method(), OraMethod::Fisher);
        assert_eq!(options.qea_method(), QeaMethod::GlobalAncova);
        assert_eq!(options.importance(), Importance::Degree);

        assert!(AnalysisOptions::parse("fisher", "ga", "closeness").is_err());
        assert!(AnalysisOptions::parse("binomial", "gt", "rbc").is_err());
        assert!(AnalysisOptions::parse("hyperg", "ancova", "rbc").is_err());
    }
}
