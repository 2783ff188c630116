#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Approval is an HR/Admin capability; the gateway decides who holds
    /// which role, this service only consumes the verdict.
    pub fn can_approve(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}
