//! Access gate combining the capability table with ownership

use crate::capability::{required_role, Action, Module};
use crate::decision::PolicyDecision;
use crate::error::{PolicyError, Result};
use inspection_types::{Caller, UserId};
use tracing::{debug, warn};

/// Stateless gate consulted by the engine before every operation
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `caller` against the capability table
    pub fn evaluate(&self, caller: &Caller, module: Module, action: Action) -> PolicyDecision {
        match required_role(module, action) {
            Some(required) if caller.role.satisfies(required) => PolicyDecision::allow(),
            Some(required) => PolicyDecision::deny(
                format!("{module}:{action} requires role {required} (caller is {})", caller.role),
                Some(required),
            ),
            None => PolicyDecision::deny(format!("{module}:{action} is not permitted"), None),
        }
    }

    /// Fail with [`PolicyError::Denied`] unless the table allows the caller
    pub fn require(&self, caller: &Caller, module: Module, action: Action) -> Result<()> {
        match self.evaluate(caller, module, action) {
            PolicyDecision::Allow => {
                debug!(user_id = %caller.user_id, %module, %action, "Access granted");
                Ok(())
            }
            PolicyDecision::Deny { reason, .. } => {
                warn!(user_id = %caller.user_id, role = %caller.role, %module, %action, "Access denied");
                Err(PolicyError::Denied { reason })
            }
        }
    }

    /// Table check followed by the ownership rule for `inspector_id`'s record
    pub fn require_owner(
        &self,
        caller: &Caller,
        module: Module,
        action: Action,
        inspector_id: &UserId,
    ) -> Result<()> {
        self.require(caller, module, action)?;
        if caller.owns(inspector_id) {
            Ok(())
        } else {
            warn!(user_id = %caller.user_id, %module, %action, "Ownership check failed");
            Err(PolicyError::Denied {
                reason: "inspectors may only access their own inspections".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspection_types::Role;

    fn caller(role: Role) -> Caller {
        Caller::new(UserId::generate(), role)
    }

    #[test]
    fn test_denial_names_required_role() {
        let gate = AccessGate::new();
        let err = gate
            .require(&caller(Role::Inspector), Module::Inspections, Action::Transition)
            .unwrap_err();
        let PolicyError::Denied { reason } = err;
        assert!(reason.contains("supervisor"), "reason was {reason}");
    }

    #[test]
    fn test_evaluate_allow_and_deny() {
        let gate = AccessGate::new();
        assert!(gate
            .evaluate(&caller(Role::Admin), Module::Audit, Action::Read)
            .is_allowed());
        assert_eq!(
            gate.evaluate(&caller(Role::Supervisor), Module::Audit, Action::Read),
            PolicyDecision::Deny {
                reason: "audit:read requires role admin (caller is supervisor)".into(),
                required: Some(Role::Admin),
            }
        );
    }

    #[test]
    fn test_require_owner() {
        let gate = AccessGate::new();
        let me = caller(Role::Inspector);
        let someone_else = UserId::generate();

        assert!(gate
            .require_owner(&me, Module::Evidence, Action::Create, &me.user_id)
            .is_ok());
        assert!(gate
            .require_owner(&me, Module::Evidence, Action::Create, &someone_else)
            .is_err());
        assert!(gate
            .require_owner(&caller(Role::Supervisor), Module::Evidence, Action::Create, &someone_else)
            .is_ok());
    }
}
