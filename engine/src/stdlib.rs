//! The built-in block kinds and the tags they answer to.

use crate::kinds::{BlockKind, controls, lists, logic, math, text, variables};
use crate::registry::Registry;

pub fn register(registry: &mut Registry) {
    registry.register_kind::<controls::If>("controls_if");
    registry.register("controls_ifelse", || {
        Box::new(controls::If::with_else()) as Box<dyn BlockKind>
    });
    registry.register("controls_repeat_ext", || {
        Box::new(controls::Repeat::from_input()) as Box<dyn BlockKind>
    });
    registry.register("controls_repeat", || {
        Box::new(controls::Repeat::from_field()) as Box<dyn BlockKind>
    });
    registry.register_kind::<controls::WhileUntil>("controls_whileUntil");
    registry.register_kind::<controls::For>("controls_for");
    registry.register_kind::<controls::ForEach>("controls_forEach");
    registry.register_kind::<controls::Flow>("controls_flow_statements");

    registry.register_kind::<logic::Boolean>("logic_boolean");
    registry.register_kind::<logic::Null>("logic_null");
    registry.register_kind::<logic::Negate>("logic_negate");
    registry.register_kind::<logic::Compare>("logic_compare");
    registry.register_kind::<logic::Operation>("logic_operation");
    registry.register_kind::<logic::Ternary>("logic_ternary");

    registry.register_kind::<math::Number>("math_number");
    registry.register_kind::<math::Arithmetic>("math_arithmetic");
    registry.register_kind::<math::Single>("math_single");
    registry.register_kind::<math::Round>("math_round");
    registry.register_kind::<math::Constant>("math_constant");
    registry.register_kind::<math::NumberProperty>("math_number_property");
    registry.register_kind::<math::Modulo>("math_modulo");
    registry.register_kind::<math::Constrain>("math_constrain");
    registry.register_kind::<math::Change>("math_change");

    registry.register_kind::<text::Text>("text");
    registry.register_kind::<text::Join>("text_join");
    registry.register_kind::<text::Append>("text_append");
    registry.register_kind::<text::Length>("text_length");
    registry.register_kind::<text::IsEmpty>("text_isEmpty");
    registry.register_kind::<text::ChangeCase>("text_changeCase");
    registry.register_kind::<text::Trim>("text_trim");

    registry.register_kind::<variables::Get>("variables_get");
    registry.register_kind::<variables::Set>("variables_set");

    registry.register_kind::<lists::CreateEmpty>("lists_create_empty");
    registry.register_kind::<lists::CreateWith>("lists_create_with");
    registry.register_kind::<lists::Repeat>("lists_repeat");
    registry.register_kind::<lists::Length>("lists_length");
    registry.register_kind::<lists::IsEmpty>("lists_isEmpty");
}
