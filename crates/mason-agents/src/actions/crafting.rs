//! Craft.

use mason_types::{ActionResult, MaterialId, Task, TaskParamError};

use super::{ActionContext, Behavior, Step};

/// Turn inventory materials into an item.
#[derive(Debug, Clone)]
pub(crate) struct Craft {
    item: MaterialId,
    quantity: u32,
}

impl Craft {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let item = MaterialId::new(task.str_param("item")?);
        let quantity = task.u32_param_or("quantity", 1)?.max(1);
        let description = format!("craft {quantity} {item}");
        Ok((Self { item, quantity }, description))
    }
}

impl Behavior for Craft {
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let result = match ctx.world.craft(ctx.agent, &self.item, self.quantity) {
            Ok(made) if made >= self.quantity => {
                ActionResult::success(format!("Crafted {made} {}", self.item))
            }
            Ok(made) => ActionResult::failure(format!(
                "Only crafted {made}/{} {}, ran out of materials",
                self.quantity, self.item
            )),
            Err(e) => ActionResult::failure(e.to_string()),
        };
        Step::Done(result)
    }
}
