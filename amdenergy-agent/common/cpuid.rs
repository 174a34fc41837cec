#[cfg(target_arch = "x86_64")]
pub fn cpuid(eax: u32, ecx: u32) -> (u32, u32, u32, u32) {
    let mut ebx: u32;
    let mut edx: u32;
    let mut eax_out = eax;
    let mut ecx_out = ecx;

    // rbx is reserved by LLVM, so it is saved around the instruction
    unsafe {
        std::arch::asm!(
            "mov {0:r}, rbx",
            "cpuid",
            "xchg {0:r}, rbx",
            out(reg) ebx,
            inout("eax") eax_out,
            inout("ecx") ecx_out,
            out("edx") edx,
            options(nostack, preserves_flags)
        );
    }

    (eax_out, ebx, ecx_out, edx)
}

#[cfg(not(target_arch = "x86_64"))]
pub fn cpuid(_eax: u32, _ecx: u32) -> (u32, u32, u32, u32) {
    (0, 0, 0, 0)
}

/// Vendor string from leaf 0, e.g. "AuthenticAMD"
pub fn vendor_id() -> String {
    let (_eax, ebx, ecx, edx) = cpuid(0, 0);
    vendor_from_registers(ebx, edx, ecx)
}

/// Vendor bytes are laid out EBX, EDX, ECX
fn vendor_from_registers(ebx: u32, edx: u32, ecx: u32) -> String {
    let mut bytes = Vec::with_capacity(12);
    for reg in [ebx, edx, ecx] {
        bytes.extend_from_slice(&reg.to_le_bytes());
    }
    String::from_utf8_lossy(&bytes)
        .trim_end_matches('\0')
        .to_string()
}

/// Display family, display model and stepping from leaf 1
pub fn signature() -> (u32, u32, u32) {
    let (eax, _ebx, _ecx, _edx) = cpuid(1, 0);
    decode_signature(eax)
}

fn decode_signature(eax: u32) -> (u32, u32, u32) {
    let stepping = eax & 0xF;
    let model = (eax >> 4) & 0xF;
    let family = (eax >> 8) & 0xF;
    let extended_model = (eax >> 16) & 0xF;
    let extended_family = (eax >> 20) & 0xFF;

    // Extended fields only apply to base family 0xF on AMD
    if family == 0xF {
        (family + extended_family, (extended_model << 4) + model, stepping)
    } else {
        (family, model, stepping)
    }
}
