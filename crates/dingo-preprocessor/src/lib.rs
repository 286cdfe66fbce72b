//! Ordered textual passes that lower Dingo-only syntax into plain,
//! parseable Go. See [`Pipeline`] for the canonical pass order.

mod enum_registry;
mod enums;
mod error_propagation;
mod imports;
mod keywords;
mod processor;
mod rust_match;
mod scan;
mod signatures;
mod type_annotations;

pub use enum_registry::{EnumDef, EnumRegistry, FieldDef, VariantDef};
pub use processor::{Pipeline, PipelineConfig, PipelineOutput, Processor, ProcessorInput, ProcessorOutput};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_runs_every_pass_in_order() {
        let source = "package p\n\nfunc F(a: int) (int, error) {\n\tlet v = doThing()?\n\treturn v, nil\n}\n";
        let output = Pipeline::standard().run("f.dingo", source, &PipelineConfig::default()).unwrap();
        assert!(output.source.contains("func F(a int) (int, error)"));
        assert!(output.source.contains("var v = __tmp1"));
        assert!(!output.map.is_empty());
    }

    #[test]
    fn idempotent_on_plain_go_with_an_identity_map() {
        let source = "package p\n\nfunc F() int {\n\treturn 1\n}\n";
        let output = Pipeline::standard().run("f.dingo", source, &PipelineConfig::default()).unwrap();
        assert_eq!(output.source, source);
        assert!(output.map.is_empty());
    }
}
