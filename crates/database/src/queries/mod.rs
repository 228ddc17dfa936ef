//! Database query operations organized by entity

pub mod customers;
pub mod invoices;
pub mod items;

// Re-export commonly used query functions
pub use customers::{
    all_customers, create_customer, delete_customer, get_customer, update_customer, NewCustomer,
};
pub use invoices::{
    all_invoice_lines, all_invoices, create_invoice, delete_invoice, get_invoice, invoice_lines,
    NewInvoice, NewInvoiceLine,
};
pub use items::{all_items, create_item, delete_item, get_item, update_item, NewItem};
