pub mod upload; // PDF upload -> extraction -> report
