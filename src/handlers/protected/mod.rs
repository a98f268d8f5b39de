// handlers/protected/mod.rs - routes that require a signed-in session
//
// Every handler here runs the ownership gate before touching data.

pub mod gate;
pub mod months;
pub mod payslip;
pub mod ppdf;
pub mod select;

pub use months::months;
pub use payslip::payslip;
pub use ppdf::ppdf;
pub use select::select;
