pub mod delay_slot_exception;
pub mod endianness;
pub mod image_from_disk;
pub mod interrupt_delivery;
pub mod jtag_stall_and_read;
pub mod tlb_refill;
