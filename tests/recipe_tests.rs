// Tests for the recipe prompt/response contract.

use cartscribe::recipe::{build_prompt, parse_recipe, SYSTEM_PROMPT};

#[test]
fn prompt_names_every_ingredient() {
    let ingredients = vec![
        "milk".to_string(),
        "eggs".to_string(),
        "flour".to_string(),
    ];
    let prompt = build_prompt(&ingredients, None);

    for ingredient in &ingredients {
        assert!(
            prompt.contains(ingredient),
            "prompt should mention {}: {}",
            ingredient,
            prompt
        );
    }
}

#[test]
fn prompt_carries_constraints_when_given() {
    let ingredients = vec!["tofu".to_string()];

    let prompt = build_prompt(&ingredients, Some("vegan, under 30 minutes"));
    assert!(prompt.contains("vegan, under 30 minutes"));

    let without = build_prompt(&ingredients, Some("   "));
    assert!(!without.contains("Constraints"));
}

#[test]
fn system_prompt_demands_json() {
    assert!(SYSTEM_PROMPT.contains("JSON"));
}

#[test]
fn parses_a_plain_json_reply() {
    let reply = r#"{
        "title": "Simple pancakes",
        "ingredients": ["milk", "eggs", "flour"],
        "steps": ["Mix everything.", "Fry in batches."]
    }"#;

    let recipe = parse_recipe(reply).expect("should parse");
    assert_eq!(recipe.title, "Simple pancakes");
    assert_eq!(recipe.ingredients.len(), 3);
    assert_eq!(recipe.steps.len(), 2);
}

#[test]
fn parses_a_fenced_json_reply() {
    let reply = "```json\n{\"title\": \"Omelette\", \"ingredients\": [\"eggs\"], \"steps\": [\"Whisk.\", \"Cook.\"]}\n```";

    let recipe = parse_recipe(reply).expect("should parse despite the fence");
    assert_eq!(recipe.title, "Omelette");
}

#[test]
fn rejects_prose_replies() {
    let reply = "Sure! Here's a nice recipe for you: start by boiling water...";
    assert!(parse_recipe(reply).is_err());
}

#[test]
fn rejects_an_empty_title() {
    let reply = r#"{"title": "  ", "ingredients": ["eggs"], "steps": ["Cook."]}"#;
    assert!(parse_recipe(reply).is_err());
}
