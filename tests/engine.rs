//! End-to-end tests driving the engine through the mapping filtering
//! application.
use sssom_t::{
	compile_source, ActionFunction, CompileContext, EngineContext, FunctionCall, FunctionError,
	Mapping, MappingAction, MappingFilterApplication, RuleEngine, TagSelection,
	TransformApplication,
};
use std::cell::RefCell;
use std::rc::Rc;

const UBERON: &str = "http://purl.obolibrary.org/obo/UBERON_";
const FBBT: &str = "http://purl.obolibrary.org/obo/FBbt_";
const EXACT_MATCH: &str = "http://www.w3.org/2004/02/skos/core#exactMatch";
const CLOSE_MATCH: &str = "http://www.w3.org/2004/02/skos/core#closeMatch";

fn filtering_engine(source: &str) -> RuleEngine<Mapping> {
	let application = MappingFilterApplication::new();
	compile_source(source, &application).unwrap()
}

#[test]
fn uriexpr_contains_selects_by_slot_value() {
	let mut engine = filtering_engine(
		"prefix COMENT: <https://example.com/entities/>\n\
		 prefix ORGENT: <https://example.org/entities/>\n\
		 prefix SCHEMA: <https://example.org/schema/>\n\
		 subject==SCHEMA:0001* && uriexpr_contains(%{subject_id}, 'field1', COMENT:*) -> include();\n",
	);

	let selected = Mapping::new(
		"https://example.org/schema/0001/(field1:'COMENT:0011',field2:'COMENT:0012')",
		EXACT_MATCH,
		"https://example.com/entities/0011",
	);
	let rejected = Mapping::new(
		"https://example.org/schema/0001/(field1:'ORGENT:0001',field2:'COMENT:0012')",
		EXACT_MATCH,
		"https://example.com/entities/0012",
	);
	// Not a URI expression at all: not selected either.
	let plain = Mapping::new("https://example.org/schema/0001/plain", EXACT_MATCH, "o");

	let products = engine.process(&[selected.clone(), rejected, plain]).unwrap();
	assert_eq!(products, [selected]);
}

#[test]
fn invert_then_stop_scenario() {
	let source = "prefix UBERON: <http://purl.obolibrary.org/obo/UBERON_>\n\
		 prefix CL: <http://purl.obolibrary.org/obo/CL_>\n\
		 prefix FBbt: <http://purl.obolibrary.org/obo/FBbt_>\n\
		 (subject==UBERON:* || subject==CL:*) -> invert();\n\
		 !(object==UBERON:* || object==CL:*) -> stop();\n\
		 subject==* -> include();\n";

	let mut engine = filtering_engine(source);

	let cross_species = Mapping::new(
		format!("{UBERON}0000468"),
		EXACT_MATCH,
		format!("{FBBT}00000001"),
	);
	let fly_only = Mapping::new(
		format!("{FBBT}00000002"),
		EXACT_MATCH,
		format!("{FBBT}00000003"),
	);

	let products = engine.process(&[cross_species, fly_only]).unwrap();

	// The first mapping is inverted by rule 1 and survives rule 2; the
	// second is stopped before `include()` can see it.
	assert_eq!(products.len(), 1);
	assert_eq!(products[0].subject_id, format!("{FBBT}00000001"));
	assert_eq!(products[0].object_id, format!("{UBERON}0000468"));
}

#[test]
fn double_inversion_is_the_identity() {
	let mut engine = filtering_engine("subject==* -> { invert(); invert(); include(); };\n");

	let mapping = Mapping::new(format!("{UBERON}1"), EXACT_MATCH, format!("{FBBT}2"));
	let products = engine.process(&[mapping.clone()]).unwrap();
	assert_eq!(products, [mapping]);
}

#[test]
fn edits_apply_to_emitted_mappings() {
	let mut engine = filtering_engine(
		"subject==* -> {\n\
		 \tassign('comment', 'rewritten');\n\
		 \treplace('object_id', 'example.org/([a-z]+)$', 'example.net/$1');\n\
		 \tinclude();\n\
		 };\n",
	);

	let mapping = Mapping::new("https://a.org/x", EXACT_MATCH, "https://example.org/object");
	let products = engine.process(&[mapping]).unwrap();

	assert_eq!(products[0].comment.as_deref(), Some("rewritten"));
	assert_eq!(products[0].object_id, "https://example.net/object");
}

#[test]
fn misspelled_function_is_a_single_compile_error() {
	let source = "prefix COMENT: <https://example.com/entities/>\n\
		 subject==COMENT:* -> include();\n\
		 uriexpr_containz(%{subject_id}, 'field1', COMENT:*) -> include();\n";

	let application = MappingFilterApplication::new();
	let errors = compile_source(source, &application).unwrap_err();

	assert_eq!(errors.len(), 1);
	let error = errors.iter().next().unwrap();
	assert_eq!(error.position.map(|p| p.line), Some(3));
	assert!(error.to_string().contains("unknown function `uriexpr_containz`"));
}

#[test]
fn nested_rules_compose_filters_and_tags() {
	let source = "prefix A: <https://example.org/a/>\n\
		 [tag1] subject==A:* {\n\
		 \t[tag2] predicate==skos:exactMatch -> include();\n\
		 }\n";

	let matching = Mapping::new("https://example.org/a/1", EXACT_MATCH, "o1");
	let wrong_predicate = Mapping::new("https://example.org/a/2", CLOSE_MATCH, "o2");
	let wrong_subject = Mapping::new("https://example.org/b/3", EXACT_MATCH, "o3");
	let mappings = [matching.clone(), wrong_predicate, wrong_subject];

	// Both the outer and the inner filter must hold.
	let mut engine = filtering_engine(source);
	let seen_tags = Rc::new(RefCell::new(Vec::new()));
	{
		let seen_tags = Rc::clone(&seen_tags);
		engine.add_listener(move |rule, _, _| seen_tags.borrow_mut().push(rule.tags.clone()));
	}
	let products = engine.process(&mappings).unwrap();
	assert_eq!(products, [matching.clone()]);

	// The emitting rule carries the union of the enclosing tag sets.
	assert_eq!(seen_tags.borrow().as_slice(), [vec!["tag1".to_owned(), "tag2".to_owned()]]);

	// Include-tags selection matches against that union.
	let mut engine = filtering_engine(source);
	engine.set_tag_selection(TagSelection::include(["tag2"]));
	assert_eq!(engine.process(&mappings).unwrap(), [matching.clone()]);

	let mut engine = filtering_engine(source);
	engine.set_tag_selection(TagSelection::include(["other"]));
	assert!(engine.process(&mappings).unwrap().is_empty());

	// So does exclude-tags.
	let mut engine = filtering_engine(source);
	engine.set_tag_selection(TagSelection::exclude(["tag1"]));
	assert!(engine.process(&mappings).unwrap().is_empty());
}

#[test]
fn cardinality_pseudo_field() {
	use sssom_t::{Cardinality, PredicateModifier};

	let mut engine = filtering_engine(
		"predicate_modifier==Not -> stop();\ncardinality==*:1 -> include();\n",
	);

	let many_to_one = {
		let mut m = Mapping::new("s1", EXACT_MATCH, "o");
		m.mapping_cardinality = Some(Cardinality::ManyToOne);
		m
	};
	let one_to_many = {
		let mut m = Mapping::new("s2", EXACT_MATCH, "o");
		m.mapping_cardinality = Some(Cardinality::OneToMany);
		m
	};
	let negated = {
		let mut m = many_to_one.clone();
		m.subject_id = "s3".to_owned();
		m.predicate_modifier = Some(PredicateModifier::Not);
		m
	};
	let unset = Mapping::new("s4", EXACT_MATCH, "o");

	let products = engine
		.process(&[many_to_one.clone(), one_to_many, negated, unset])
		.unwrap();
	assert_eq!(products, [many_to_one]);
}

#[test]
fn products_preserve_rule_and_mapping_order() {
	let source = "prefix A: <https://example.org/a/>\n\
		 subject==A:* -> assign('comment', 'first');\n\
		 subject==A:* -> include();\n\
		 subject==A:* -> { assign('comment', 'second'); include(); };\n";

	let m1 = Mapping::new("https://example.org/a/1", EXACT_MATCH, "o1");
	let m2 = Mapping::new("https://example.org/a/2", EXACT_MATCH, "o2");

	let mut engine = filtering_engine(source);
	let products = engine.process(&[m1, m2]).unwrap();

	let describe: Vec<_> = products
		.iter()
		.map(|m| (m.subject_id.as_str(), m.comment.as_deref().unwrap()))
		.collect();
	assert_eq!(
		describe,
		[
			("https://example.org/a/1", "first"),
			("https://example.org/a/1", "second"),
			("https://example.org/a/2", "first"),
			("https://example.org/a/2", "second"),
		]
	);
}

#[test]
fn processing_is_deterministic_across_runs() {
	let source = "prefix A: <https://example.org/a/>\n\
		 subject==A:* -> invert();\n\
		 object==A:* -> include();\n";

	let mappings = [
		Mapping::new("https://example.org/a/1", EXACT_MATCH, "https://example.org/b/1"),
		Mapping::new("https://example.org/b/2", EXACT_MATCH, "https://example.org/a/2"),
	];

	let mut engine = filtering_engine(source);
	let first = engine.process(&mappings).unwrap();
	let second = engine.process(&mappings).unwrap();
	assert_eq!(first, second);
}

#[test]
fn exists_consults_the_application_entity_checker() {
	use sssom_t::EntityChecker;

	let mut application = MappingFilterApplication::new();
	application
		.entity_checker_mut()
		.add_class("https://example.org/a/known");

	let mut engine = compile_source(
		"prefix A: <https://example.org/a/>\nexists(%{subject_id}) -> include();\n",
		&application,
	)
	.unwrap();

	let known = Mapping::new("https://example.org/a/known", EXACT_MATCH, "o");
	let unknown = Mapping::new("https://example.org/a/unknown", EXACT_MATCH, "o");
	let products = engine.process(&[known.clone(), unknown]).unwrap();
	assert_eq!(products, [known]);
}

/// An action function that always fails at run time.
struct FailingFunction;

struct FailNow;

impl ActionFunction<Mapping> for FailingFunction {
	fn signature(&self) -> &str {
		""
	}

	fn resolve(
		&self,
		_: &FunctionCall,
		_: &CompileContext,
	) -> Result<Box<dyn MappingAction<Mapping>>, FunctionError> {
		Ok(Box::new(FailNow))
	}
}

impl MappingAction<Mapping> for FailNow {
	fn apply(&self, _: &Mapping, _: &EngineContext) -> Result<Option<Mapping>, FunctionError> {
		Err(FunctionError::new("fail", "deliberate failure"))
	}
}

#[test]
fn runtime_errors_drop_the_mapping_by_default() {
	let source = "prefix A: <https://example.org/a/>\n\
		 subject==A:1 -> fail();\n\
		 subject==* -> include();\n";

	let mut application = MappingFilterApplication::new();
	application.functions_mut().register_action("fail", FailingFunction);

	let failing = Mapping::new("https://example.org/a/1", EXACT_MATCH, "o1");
	let fine = Mapping::new("https://example.org/a/2", EXACT_MATCH, "o2");

	// Default: the failing mapping is dropped, the rest goes through.
	let mut engine = compile_source(source, &application).unwrap();
	let products = engine.process(&[failing.clone(), fine.clone()]).unwrap();
	assert_eq!(products, [fine.clone()]);

	// Strict: the run aborts on the failing mapping.
	let mut engine = compile_source(source, &application).unwrap();
	engine.set_strict(true);
	let error = engine.process(&[failing, fine]).unwrap_err();
	assert_eq!(error.index, 0);
}

#[test]
fn listeners_fire_in_emission_order() {
	let source = "prefix A: <https://example.org/a/>\n\
		 subject==A:* -> include();\n\
		 subject==* -> include();\n";

	let mut engine = filtering_engine(source);
	let events = Rc::new(RefCell::new(Vec::new()));
	{
		let events = Rc::clone(&events);
		engine.add_listener(move |rule, mapping, _product: &Mapping| {
			events
				.borrow_mut()
				.push((rule.path.clone(), mapping.subject_id.clone()));
		});
	}

	let m1 = Mapping::new("https://example.org/a/1", EXACT_MATCH, "o1");
	let m2 = Mapping::new("https://example.org/b/2", EXACT_MATCH, "o2");
	let products = engine.process(&[m1, m2]).unwrap();

	assert_eq!(products.len(), 3);
	assert_eq!(
		events.borrow().as_slice(),
		[
			("1".to_owned(), "https://example.org/a/1".to_owned()),
			("2".to_owned(), "https://example.org/a/1".to_owned()),
			("2".to_owned(), "https://example.org/b/2".to_owned()),
		]
	);
}

#[test]
fn include_requires_a_mapping_producing_application() {
	/// An application producing strings, with no `include()` support.
	#[derive(Default)]
	struct StringApplication;

	impl TransformApplication for StringApplication {
		type Product = String;
	}

	let errors = compile_source("subject==* -> include();", &StringApplication).unwrap_err();
	assert_eq!(errors.len(), 1);
	assert!(errors
		.iter()
		.next()
		.unwrap()
		.to_string()
		.contains("`include()` is not supported"));
}
