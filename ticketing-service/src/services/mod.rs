pub mod tickets;

pub use tickets::{ResolveError, Ticket, TicketStatus, TicketStore};
