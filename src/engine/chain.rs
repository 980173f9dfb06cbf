//! Command chain
//!
//! A chain binds one request's parameters to a static step table. The cursor
//! only moves forward; the chain is dropped once its terminal step has run or
//! its error handler has fired.

use super::catalog::{ErrorHandler, Step};
use super::params::NetworkParams;

#[derive(Debug)]
pub struct CommandChain {
    params: NetworkParams,
    steps: &'static [Step],
    cursor: usize,
    on_error: Option<ErrorHandler>,
}

impl CommandChain {
    pub fn new(params: NetworkParams, steps: &'static [Step], on_error: Option<ErrorHandler>) -> Self {
        Self {
            params,
            steps,
            cursor: 0,
            on_error,
        }
    }

    /// The next unexecuted step, or `None` once the table is exhausted
    pub fn advance(&mut self) -> Option<Step> {
        let step = self.steps.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(step)
    }

    /// Number of steps already handed out
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut NetworkParams {
        &mut self.params
    }

    pub fn error_handler(&self) -> Option<ErrorHandler> {
        self.on_error
    }

    pub fn into_params(self) -> NetworkParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::catalog::{Completion, INTERFACE_STATS_CHAIN, TETHERING_ROLLBACK_CHAIN};

    #[test]
    fn test_advance_walks_table_once() {
        let mut chain = CommandChain::new(NetworkParams::default(), INTERFACE_STATS_CHAIN, None);
        assert_eq!(INTERFACE_STATS_CHAIN.len(), 3);
        assert_eq!(chain.position(), 0);

        assert_eq!(chain.advance(), Some(Step::GetRxBytes));
        assert_eq!(chain.advance(), Some(Step::GetTxBytes));
        assert_eq!(chain.advance(), Some(Step::Finish(Completion::Stats)));
        assert_eq!(chain.advance(), None);
        assert_eq!(chain.advance(), None);
        assert_eq!(chain.position(), 3);
    }

    #[test]
    fn test_params_are_owned_by_chain() {
        let params = NetworkParams {
            id: 21,
            ..Default::default()
        };
        let mut chain = CommandChain::new(params, TETHERING_ROLLBACK_CHAIN, Some(ErrorHandler::Report));
        chain.params_mut().rx_bytes = 5.0;

        assert_eq!(chain.error_handler(), Some(ErrorHandler::Report));
        let params = chain.into_params();
        assert_eq!(params.id, 21);
        assert_eq!(params.rx_bytes, 5.0);
    }
}
