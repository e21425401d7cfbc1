//! Text and JSON Rendering
//!
//! Resolvers hand back records; everything a caller reads is produced here.
//! Every function is pure, so identical records always render to identical
//! bytes.

use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{Architecture, Instruction, Register};
use crate::resolver::{Comparison, Page, Presence, SearchHit, SearchOutcome};

/// Register classes with more members than this are abbreviated.
const REGISTER_CLASS_PREVIEW: usize = 8;

/// `{"architectures": [...]}`
pub fn architectures(archs: &[Arc<Architecture>]) -> String {
    let names: Vec<&str> = archs.iter().map(|a| a.name.as_str()).collect();
    json!({ "architectures": names }).to_string()
}

/// Architecture overview.
pub fn architecture_detail(arch: &Architecture, instruction_count: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("Architecture: {}\n", arch.name));
    out.push_str(&format!("Description: {}\n", arch.description));
    out.push_str(&format!("Word Size: {} bits\n", arch.word_size));
    out.push_str(&format!("Endianness: {}\n", arch.endianness));
    out.push_str(&format!("Machine Mode: {}\n", arch.machine_mode));

    let gprs: Vec<&str> = arch.main_gprs().map(|r| r.name.as_str()).collect();
    if !gprs.is_empty() {
        out.push_str(&format!("General Purpose Registers: {}\n", gprs.join(", ")));
    }

    // Other classes in first-appearance order
    let mut classes: Vec<(&str, Vec<&str>)> = Vec::new();
    for reg in arch.registers.iter().filter(|r| r.class != "gpr") {
        match classes.iter_mut().find(|(c, _)| *c == reg.class.as_str()) {
            Some((_, names)) => names.push(reg.name.as_str()),
            None => classes.push((reg.class.as_str(), vec![reg.name.as_str()])),
        }
    }
    for (class, names) in classes {
        let label = class.to_uppercase();
        if names.len() > REGISTER_CLASS_PREVIEW {
            out.push_str(&format!(
                "{} Registers: {} ... ({} total)\n",
                label,
                names[..REGISTER_CLASS_PREVIEW].join(", "),
                names.len()
            ));
        } else {
            out.push_str(&format!("{} Registers: {}\n", label, names.join(", ")));
        }
    }

    if !arch.addressing_modes.is_empty() {
        let modes: Vec<String> = arch
            .addressing_modes
            .iter()
            .map(|m| {
                if m.example_syntax.is_empty() {
                    m.name.clone()
                } else {
                    format!("{} ({})", m.name, m.example_syntax)
                }
            })
            .collect();
        out.push_str(&format!("Addressing Modes: {}\n", modes.join(", ")));
    }

    out.push_str(&format!("Instructions Available: {}", instruction_count));
    out
}

/// Unique mnemonics, one `- MNEMONIC` line each.
pub fn instruction_list(arch: &str, instructions: &[Arc<Instruction>]) -> String {
    if instructions.is_empty() {
        return format!("No instructions found for architecture '{}'", arch);
    }
    let mut mnemonics: Vec<&str> = instructions.iter().map(|i| i.mnemonic.as_str()).collect();
    mnemonics.sort_unstable();
    mnemonics.dedup();
    mnemonics
        .iter()
        .map(|m| format!("- {}", m))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every variant of one instruction, separated by blank lines.
pub fn instruction_detail(variants: &[Arc<Instruction>]) -> String {
    variants
        .iter()
        .map(|i| instruction_block(i))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn instruction_block(instr: &Instruction) -> String {
    let mut out = String::new();
    out.push_str(&format!("Instruction: {}\n", instr.mnemonic));
    if let Some(variant) = &instr.variant {
        out.push_str(&format!("Variant: {}\n", variant));
    }
    out.push_str(&format!("Description: {}\n", instr.description));
    out.push_str(&format!("Syntax: {}\n", instr.syntax));

    let operands: Vec<String> = instr
        .operands
        .iter()
        .map(|op| match &op.size {
            Some(size) => format!("{} ({} {}, {})", op.name, op.kind, size, op.access),
            None => format!("{} ({}, {})", op.name, op.kind, op.access),
        })
        .collect();
    out.push_str(&format!("Operands: {}\n", or_none(&operands)));
    out.push_str(&format!("Flags Affected: {}\n", or_none(&instr.flags_affected)));
    out.push_str(&format!("Category: {}\n", instr.category));
    out.push_str(&format!("Extension: {}\n", instr.extension));
    out.push_str(&format!("CPU Features: {}\n", or_none(&instr.cpuid_features)));
    if let Some(cpl) = instr.cpl {
        out.push_str(&format!("Privilege Level: {}\n", cpl));
    }
    if instr.deprecated {
        out.push_str("Deprecated: yes\n");
    }
    out.push_str("Examples:\n");
    out.push_str(&format!("  {}", instr.syntax));
    out
}

fn or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// `{"groups": {category: [mnemonics]}}`
pub fn instruction_groups(groups: &BTreeMap<String, Vec<String>>) -> String {
    json!({ "groups": groups }).to_string()
}

#[derive(Serialize)]
struct RegisterView<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    width_bits: u32,
    is_main_register: bool,
    aliases: &'a [String],
    calling_convention: Option<String>,
    purpose: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_register: Option<&'a str>,
}

/// `{"registers": [...]}`; input is expected in (type, name) order.
pub fn registers(registers: &[Register]) -> String {
    let views: Vec<RegisterView<'_>> = registers
        .iter()
        .map(|r| RegisterView {
            name: &r.name,
            kind: r.display_type(),
            width_bits: r.width_bits,
            is_main_register: r.is_main_register,
            aliases: &r.aliases,
            calling_convention: r.calling_convention.map(|p| p.to_string()),
            purpose: r.purpose.as_deref(),
            encoding_id: r.encoding_id,
            parent_register: r.parent.as_deref(),
        })
        .collect();
    json!({ "registers": views }).to_string()
}

/// One ranked hit: `arch: MNEMONIC [variant] (category) - description`.
fn hit_line(instr: &Instruction) -> String {
    let mut line = format!("{}: {}", instr.architecture, instr.mnemonic);
    if let Some(variant) = &instr.variant {
        line.push_str(&format!(" [{}]", variant));
    }
    if !instr.category.is_empty() {
        line.push_str(&format!(" ({})", instr.category));
    }
    line.push_str(&format!(" - {}", instr.description));
    line
}

/// Ranked search results with a notice when more matches exist.
pub fn search_outcome(outcome: &SearchOutcome) -> String {
    if outcome.is_empty() {
        return match &outcome.architecture {
            Some(arch) => format!(
                "No instructions found matching '{}' in architecture '{}'",
                outcome.query, arch
            ),
            None => format!("No instructions found matching '{}'", outcome.query),
        };
    }
    let mut out = outcome
        .hits
        .iter()
        .map(|h| hit_line(&h.instruction))
        .collect::<Vec<_>>()
        .join("\n");
    if outcome.truncated() {
        out.push_str(&format!(
            "\n\n... showing {} of {} matches. More results exist; refine the query \
             or use search_instructions_paginated.",
            outcome.hits.len(),
            outcome.total_matches
        ));
    }
    out
}

/// Side-by-side listing with an explicit marker for absent architectures.
pub fn comparison(comparison: &Comparison) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Comparison of {} across {} architecture(s): present in {}, absent in {}\n",
        comparison.mnemonic,
        comparison.entries.len(),
        comparison.present_count(),
        comparison.entries.len() - comparison.present_count()
    ));
    for entry in &comparison.entries {
        out.push('\n');
        match &entry.presence {
            Presence::Absent => {
                out.push_str(&format!(
                    "{}: ABSENT (not present in this architecture)\n",
                    entry.architecture
                ));
            }
            Presence::Present(variants) => {
                out.push_str(&format!(
                    "{}: PRESENT ({} variant(s))\n",
                    entry.architecture,
                    variants.len()
                ));
                for v in variants {
                    out.push_str(&format!(
                        "  [{}] {} | {} | {} | {}\n",
                        v.variant_tag(),
                        v.syntax,
                        v.category,
                        v.extension,
                        v.description
                    ));
                }
            }
        }
    }
    out.trim_end().to_string()
}

/// Paginated instruction listing: `MNEMONIC` or `MNEMONIC [variant]`.
pub fn instructions_page(page: &Page<Arc<Instruction>>) -> String {
    let data: Vec<String> = page
        .items
        .iter()
        .map(|i| match &i.variant {
            Some(v) => format!("{} [{}]", i.mnemonic, v),
            None => i.mnemonic.clone(),
        })
        .collect();
    paginated(&data, page)
}

/// Paginated search results.
pub fn search_page(page: &Page<SearchHit>) -> String {
    let data: Vec<String> = page
        .items
        .iter()
        .map(|h| {
            format!(
                "{}: {} - {}",
                h.instruction.architecture, h.instruction.mnemonic, h.instruction.description
            )
        })
        .collect();
    paginated(&data, page)
}

fn paginated<T>(data: &[String], page: &Page<T>) -> String {
    let body = json!({ "data": data, "pagination": page.meta });
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
}

/// `{"error": message}` for JSON resources.
pub fn json_error(message: &str) -> String {
    json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Endianness;

    fn register(name: &str, class: &str) -> Register {
        Register {
            name: name.to_string(),
            class: class.to_string(),
            width_bits: 64,
            encoding_id: None,
            is_main_register: true,
            parent: None,
            aliases: vec![],
            calling_convention: None,
            purpose: None,
        }
    }

    #[test]
    fn test_architecture_detail_abbreviates_large_classes() {
        let mut registers = vec![register("X0", "gpr"), register("X1", "gpr")];
        for i in 0..10 {
            registers.push(register(&format!("V{}", i), "simd"));
        }
        let arch = Architecture {
            name: "aarch64".to_string(),
            description: "ARM 64-bit".to_string(),
            word_size: 64,
            endianness: Endianness::Bi,
            machine_mode: "AArch64".to_string(),
            registers,
            addressing_modes: vec![],
        };
        let text = architecture_detail(&arch, 3);
        assert!(text.contains("Word Size: 64 bits"));
        assert!(text.contains("Endianness: bi"));
        assert!(text.contains("General Purpose Registers: X0, X1"));
        assert!(text.contains("SIMD Registers: V0, V1, V2, V3, V4, V5, V6, V7 ... (10 total)"));
        assert!(!text.contains("Addressing Modes"));
        assert!(text.ends_with("Instructions Available: 3"));
    }

    #[test]
    fn test_instruction_list_dedups_mnemonics() {
        let mk = |m: &str, v: Option<&str>| {
            let mut instr: Instruction = serde_json::from_value(serde_json::json!({
                "architecture": "x86_64",
                "mnemonic": m,
            }))
            .unwrap();
            instr.variant = v.map(str::to_string);
            Arc::new(instr)
        };
        let list = vec![mk("ADD", None), mk("MOV", Some("a")), mk("MOV", Some("b"))];
        assert_eq!(instruction_list("x86_64", &list), "- ADD\n- MOV");
        assert_eq!(
            instruction_list("riscv64", &[]),
            "No instructions found for architecture 'riscv64'"
        );
    }

    #[test]
    fn test_registers_json_shape() {
        let mut rax = register("RAX", "gpr");
        rax.encoding_id = Some(0);
        rax.aliases = vec!["EAX".to_string()];
        let text = registers(&[rax]);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let reg = &value["registers"][0];
        assert_eq!(reg["type"], "general-purpose");
        assert_eq!(reg["encoding_id"], 0);
        assert_eq!(reg["aliases"][0], "EAX");
        assert!(reg.get("parent_register").is_none());
        assert!(reg["calling_convention"].is_null());
    }

    #[test]
    fn test_comparison_layout() {
        let instr: Instruction = serde_json::from_value(serde_json::json!({
            "architecture": "x86_64",
            "mnemonic": "ADD",
            "syntax": "ADD r64, r64",
            "category": "arithmetic",
            "extension": "base",
            "description": "Add",
        }))
        .unwrap();
        let comparison = Comparison {
            mnemonic: "ADD".to_string(),
            entries: vec![
                crate::resolver::ComparisonEntry {
                    architecture: "riscv64".to_string(),
                    presence: Presence::Absent,
                },
                crate::resolver::ComparisonEntry {
                    architecture: "x86_64".to_string(),
                    presence: Presence::Present(vec![Arc::new(instr)]),
                },
            ],
        };
        assert_eq!(
            super::comparison(&comparison),
            "Comparison of ADD across 2 architecture(s): present in 1, absent in 1\n\
             \n\
             riscv64: ABSENT (not present in this architecture)\n\
             \n\
             x86_64: PRESENT (1 variant(s))\n  \
             [base] ADD r64, r64 | arithmetic | base | Add"
        );
    }
}
