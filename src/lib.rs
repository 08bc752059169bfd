//! The telos compiler pipeline: LTLf instruction in, plan library out.
pub mod cmdline;
pub mod driver;
pub mod elog;
pub mod ltlf;
