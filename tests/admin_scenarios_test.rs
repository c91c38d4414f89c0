use std::sync::Arc;

use rstest::{fixture, rstest};

use pagebounds::application::services::{MoveRequest, PageAction, PageAdmin};
use pagebounds::application::{ApplicationError, FormErrors, FormField, PageSubmission};
use pagebounds::domain::{MovePosition, PageArena, PageId, Region, Template, TemplateRegistry};
use pagebounds::util::testing;

fn registry() -> Arc<TemplateRegistry> {
    let mut registry = TemplateRegistry::new();
    registry
        .register_all([
            Template::new("Internal Page", "pages/internal.html")
                .with_key("internalpage")
                .with_region(Region::new("main", "Main Content")),
            Template::new("Home Page", "pages/home_page.html")
                .with_key("homepage")
                .with_region(Region::new("home_main", "Main Content"))
                .unique(true)
                .first_level_only(true)
                .no_children(true),
        ])
        .expect("templates register");
    Arc::new(registry)
}

fn admin(max_navigation_level: Option<usize>) -> PageAdmin {
    testing::init_test_setup();
    PageAdmin::new(registry(), PageArena::new(), max_navigation_level)
}

#[fixture]
fn limited() -> PageAdmin {
    admin(Some(3))
}

fn submit(
    admin: &mut PageAdmin,
    slug: &str,
    template: &str,
    parent: Option<PageId>,
) -> Result<PageId, ApplicationError> {
    let mut submission = PageSubmission::new(slug, slug, template);
    submission.parent = parent;
    admin.add_page(submission)
}

fn form_errors(result: Result<PageId, ApplicationError>) -> FormErrors {
    match result {
        Err(ApplicationError::InvalidForm(errors)) => errors,
        other => panic!("expected form errors, got {other:?}"),
    }
}

#[rstest]
fn given_max_three_levels_when_adding_fourth_level_then_rejects_parent(mut limited: PageAdmin) {
    let level1 = submit(&mut limited, "level1", "internalpage", None).unwrap();
    let level2 = submit(&mut limited, "level2", "internalpage", Some(level1)).unwrap();
    let level3 = submit(&mut limited, "level3", "internalpage", Some(level2)).unwrap();

    let errors = form_errors(submit(&mut limited, "level4", "internalpage", Some(level3)));

    assert_eq!(errors.get(FormField::Parent), ["Only 3 levels allowed"]);
    assert_eq!(limited.tree().len(), 3);
    assert_eq!(limited.tree().depth(), 3);
}

#[test]
fn given_unlimited_depth_when_nesting_ten_levels_then_all_succeed() {
    let mut admin = admin(None);
    let mut parent = None;

    for level in 1..=10 {
        let id = submit(&mut admin, &format!("level{level}"), "internalpage", parent).unwrap();
        parent = Some(id);
    }

    assert_eq!(admin.tree().depth(), 10);
}

#[test]
fn given_zero_depth_limit_when_nesting_then_is_unlimited() {
    let mut admin = admin(Some(0));
    let mut parent = None;

    for level in 1..=5 {
        parent = Some(submit(&mut admin, &format!("level{level}"), "internalpage", parent).unwrap());
    }

    assert_eq!(admin.validator().max_navigation_level(), None);
    assert_eq!(admin.tree().depth(), 5);
}

#[test]
fn given_unique_template_in_use_when_adding_second_then_template_is_unavailable() {
    let mut admin = admin(None);
    submit(&mut admin, "home", "homepage", None).unwrap();

    let errors = form_errors(submit(&mut admin, "home2", "homepage", None));

    assert_eq!(errors.fields(), vec![FormField::TemplateKey]);
    let form = admin.form(None, None).unwrap();
    assert_eq!(form.default_template(), Some("internalpage"));
}

#[test]
fn given_plain_page_when_adding_first_level_template_below_then_rejects() {
    let mut admin = admin(None);
    let test = submit(&mut admin, "test", "internalpage", None).unwrap();

    let errors = form_errors(submit(&mut admin, "home", "homepage", Some(test)));

    assert_eq!(
        errors.get(FormField::Parent),
        ["This template can't be used as a subpage"]
    );
}

#[test]
fn given_no_children_page_when_adding_child_then_rejects() {
    let mut admin = admin(None);
    let home = submit(&mut admin, "home", "homepage", None).unwrap();

    let errors = form_errors(submit(&mut admin, "test", "internalpage", Some(home)));

    assert_eq!(
        errors.get(FormField::Parent),
        ["This parent page can't have subpages"]
    );
    assert_eq!(
        admin.actions(home).unwrap(),
        vec![
            PageAction::Edit,
            PageAction::Placeholder,
            PageAction::ViewOnSite,
            PageAction::Delete
        ]
    );
}

#[rstest]
#[case::into_no_children(MovePosition::LastChild, "home", "This page can't have subpages")]
#[case::below_depth_limit(MovePosition::FirstChild, "level3", "Only 3 levels allowed")]
#[case::beside_deepest(MovePosition::Right, "level3", "Only 3 levels allowed")]
fn given_invalid_drop_when_moving_then_rejects_and_keeps_tree(
    mut limited: PageAdmin,
    #[case] position: MovePosition,
    #[case] target: &str,
    #[case] message: &str,
) {
    submit(&mut limited, "home", "homepage", None).unwrap();
    let level1 = submit(&mut limited, "level1", "internalpage", None).unwrap();
    let level2 = submit(&mut limited, "level2", "internalpage", Some(level1)).unwrap();
    submit(&mut limited, "level3", "internalpage", Some(level2)).unwrap();
    let branch = submit(&mut limited, "branch", "internalpage", None).unwrap();
    submit(&mut limited, "leaf", "internalpage", Some(branch)).unwrap();
    let pasted_on = limited.page_id(target).unwrap();
    let before = limited.tree().clone();

    let rejected = limited
        .move_node(MoveRequest {
            cut_item: branch,
            pasted_on,
            position,
        })
        .unwrap_err();

    assert_eq!(rejected.message, message);
    let slugs = |tree: &PageArena| -> Vec<String> {
        tree.iter().map(|(_, p)| p.data.slug.clone()).collect()
    };
    assert_eq!(slugs(limited.tree()), slugs(&before));
}

#[test]
fn given_first_level_page_when_moving_beside_child_then_rejects() {
    let mut admin = admin(None);
    let home = submit(&mut admin, "home", "homepage", None).unwrap();
    let about = submit(&mut admin, "about", "internalpage", None).unwrap();
    let team = submit(&mut admin, "team", "internalpage", Some(about)).unwrap();

    let rejected = admin
        .move_node(MoveRequest {
            cut_item: home,
            pasted_on: team,
            position: MovePosition::Left,
        })
        .unwrap_err();

    assert_eq!(rejected.message, "This page can't be used as subpage.");
}

#[test]
fn given_valid_branch_move_when_moving_then_descendants_are_relevelled() {
    let mut admin = admin(Some(3));
    let about = submit(&mut admin, "about", "internalpage", None).unwrap();
    let branch = submit(&mut admin, "branch", "internalpage", None).unwrap();
    let leaf = submit(&mut admin, "leaf", "internalpage", Some(branch)).unwrap();

    admin
        .move_node(MoveRequest {
            cut_item: branch,
            pasted_on: about,
            position: MovePosition::FirstChild,
        })
        .unwrap();

    let tree = admin.tree();
    assert_eq!(tree.get(branch).unwrap().parent, Some(about));
    assert_eq!(tree.get(leaf).unwrap().depth(), 3);
    assert!(admin.validator().audit(tree).is_empty());
}
